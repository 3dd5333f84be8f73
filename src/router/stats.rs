//! Статистика доставки: счётчики по темам, итоговые счётчики и множество
//! «мёртвых» тем.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Index,
};

use super::ReservedKeys;

/// Изменяемое состояние статистики внутри маршрутизатора.
#[derive(Debug, Clone)]
pub(crate) struct Statistics {
    total_key: String,
    dead_key: String,
    counters: BTreeMap<String, u64>,
    dead_topics: BTreeSet<String>,
}

impl Statistics {
    pub(crate) fn new(keys: &ReservedKeys) -> Self {
        let mut counters = BTreeMap::new();
        counters.insert(keys.total.clone(), 0);
        counters.insert(keys.dead.clone(), 0);
        Self {
            total_key: keys.total.clone(),
            dead_key: keys.dead.clone(),
            counters,
            dead_topics: BTreeSet::new(),
        }
    }

    /// Создаёт счётчик темы, если его ещё нет.
    pub(crate) fn ensure_topic(
        &mut self,
        topic: &str,
    ) {
        if !self.counters.contains_key(topic) {
            self.counters.insert(topic.to_string(), 0);
        }
    }

    /// Публикация доставлена: счётчик темы и итоговый.
    pub(crate) fn record_sent(
        &mut self,
        topic: &str,
    ) {
        bump(&mut self.counters, topic);
        bump(&mut self.counters, &self.total_key);
    }

    /// Публикация без подписчиков: счётчик темы, `dead`, итоговый, и тема
    /// попадает в множество мёртвых.
    pub(crate) fn record_dead(
        &mut self,
        topic: &str,
    ) {
        bump(&mut self.counters, topic);
        bump(&mut self.counters, &self.dead_key);
        bump(&mut self.counters, &self.total_key);
        self.mark_dead(topic);
    }

    pub(crate) fn mark_dead(
        &mut self,
        topic: &str,
    ) {
        if !self.dead_topics.contains(topic) {
            self.dead_topics.insert(topic.to_string());
        }
    }

    pub(crate) fn revive(
        &mut self,
        topic: &str,
    ) {
        self.dead_topics.remove(topic);
    }

    pub(crate) fn dead_topics(&self) -> BTreeSet<String> {
        self.dead_topics.clone()
    }

    pub(crate) fn snapshot(&self) -> Stats {
        Stats {
            total_key: self.total_key.clone(),
            dead_key: self.dead_key.clone(),
            counters: self.counters.clone(),
        }
    }
}

fn bump(
    counters: &mut BTreeMap<String, u64>,
    key: &str,
) {
    match counters.get_mut(key) {
        Some(n) => *n += 1,
        None => {
            counters.insert(key.to_string(), 1);
        }
    }
}

/// Неизменяемый снимок счётчиков на момент вызова `stats()`.
///
/// Изменение снимка не влияет на маршрутизатор.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    total_key: String,
    dead_key: String,
    counters: BTreeMap<String, u64>,
}

impl Stats {
    /// Значение счётчика по ключу (тема или зарезервированный ключ); 0, если
    /// счётчика нет.
    pub fn get(
        &self,
        key: &str,
    ) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.get(&self.total_key)
    }

    pub fn dead(&self) -> u64 {
        self.get(&self.dead_key)
    }

    /// Счётчик темы, если тема уже встречалась.
    pub fn topic(
        &self,
        topic: &str,
    ) -> Option<u64> {
        self.counters.get(topic).copied()
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.counters.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: u64,
    ) -> Option<u64> {
        self.counters.insert(key.into(), value)
    }

    pub fn into_inner(self) -> BTreeMap<String, u64> {
        self.counters
    }
}

impl Index<&str> for Stats {
    type Output = u64;

    /// Паникует, если счётчика нет; используйте [`Stats::get`] для
    /// значения по умолчанию.
    fn index(
        &self,
        key: &str,
    ) -> &u64 {
        &self.counters[key]
    }
}

/// Текстовая сводка для человека: счётчики, мёртвые темы, подписчики.
#[derive(Debug, Clone)]
pub struct Report {
    pub stats: Stats,
    pub dead_topics: BTreeSet<String>,
    pub subscribers: BTreeMap<String, Vec<String>>,
}

impl fmt::Display for Report {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let width = self.stats.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

        writeln!(f, "counters:")?;
        for (key, value) in self.stats.iter() {
            writeln!(f, "  {key:<width$}  {value}")?;
        }

        let dead: Vec<&str> = self.dead_topics.iter().map(String::as_str).collect();
        writeln!(f, "dead topics: [{}]", dead.join(", "))?;

        writeln!(f, "subscribers:")?;
        for (topic, subs) in &self.subscribers {
            writeln!(f, "  {topic} -> [{}]", subs.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> Statistics {
        Statistics::new(&ReservedKeys::default())
    }

    /// Тест проверяет, что итоговые счётчики существуют с нуля.
    #[test]
    fn test_initial_counters() {
        let snap = stats().snapshot();
        assert_eq!(snap.total(), 0);
        assert_eq!(snap.dead(), 0);
        assert!(snap.contains(".total"));
        assert!(snap.contains(".dead"));
    }

    /// Тест проверяет учёт доставленных и мёртвых публикаций.
    #[test]
    fn test_record_sent_and_dead() {
        let mut s = stats();
        s.ensure_topic("orders");
        assert_eq!(s.snapshot().topic("orders"), Some(0));

        s.record_sent("orders");
        s.record_sent("orders");
        s.record_dead("nobody");

        let snap = s.snapshot();
        assert_eq!(snap["orders"], 2);
        assert_eq!(snap.get("nobody"), 1);
        assert_eq!(snap.total(), 3);
        assert_eq!(snap.dead(), 1);
        assert!(s.dead_topics().contains("nobody"));
    }

    /// Тест проверяет, что ensure_topic не сбрасывает существующий счётчик.
    #[test]
    fn test_ensure_topic_keeps_value() {
        let mut s = stats();
        s.record_sent("a");
        s.ensure_topic("a");
        assert_eq!(s.snapshot().get("a"), 1);
    }

    /// Тест проверяет вход и выход темы из множества мёртвых.
    #[test]
    fn test_dead_topic_transitions() {
        let mut s = stats();
        s.mark_dead("t");
        s.mark_dead("t");
        assert_eq!(s.dead_topics().len(), 1);
        s.revive("t");
        assert!(s.dead_topics().is_empty());
    }

    /// Тест проверяет, что снимок независим от состояния.
    #[test]
    fn test_snapshot_is_a_copy() {
        let mut s = stats();
        s.record_sent("x");
        let mut snap = s.snapshot();
        snap.insert("x", 100);
        assert_eq!(s.snapshot().get("x"), 1);
    }

    /// Тест проверяет сортировку в текстовой сводке.
    #[test]
    fn test_report_rendering_sorted() {
        let mut s = stats();
        s.record_sent("zeta");
        s.record_dead("alpha");
        let report = Report {
            stats: s.snapshot(),
            dead_topics: s.dead_topics(),
            subscribers: BTreeMap::from([("zeta".to_string(), vec!["Sub#0x1".to_string()])]),
        };
        let text = report.to_string();

        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("alpha") < pos("zeta"));
        assert!(text.contains("dead topics: [alpha]"));
        assert!(text.contains("zeta -> [Sub#0x1]"));
    }
}
