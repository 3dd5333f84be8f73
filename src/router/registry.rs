use std::collections::BTreeMap;

use super::{identity, same_subscriber, SubscriberRef};

/// Результат удаления подписчика из темы.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    /// Темы ещё нет в реестре.
    UnknownTopic,
    /// Подписчик не был подписан на тему.
    NotSubscribed,
    /// Подписчик удалён; `now_empty`: у темы не осталось подписчиков.
    Removed { now_empty: bool },
}

/// Реестр подписок: тема → подписчики без повторов.
///
/// Пустые после удаления коллекции сохраняются.
#[derive(Default, Clone)]
pub(crate) struct Registry {
    topics: BTreeMap<String, Vec<SubscriberRef>>,
}

impl Registry {
    /// Добавляет подписчика; `false`, если он уже был подписан.
    pub(crate) fn add(
        &mut self,
        topic: &str,
        subscriber: &SubscriberRef,
    ) -> bool {
        let subs = self.topics.entry(topic.to_string()).or_default();
        if subs.iter().any(|s| same_subscriber(s, subscriber)) {
            return false;
        }
        subs.push(SubscriberRef::clone(subscriber));
        true
    }

    pub(crate) fn remove(
        &mut self,
        topic: &str,
        subscriber: &SubscriberRef,
    ) -> Removal {
        let Some(subs) = self.topics.get_mut(topic) else {
            return Removal::UnknownTopic;
        };
        match subs.iter().position(|s| same_subscriber(s, subscriber)) {
            Some(idx) => {
                subs.swap_remove(idx);
                Removal::Removed {
                    now_empty: subs.is_empty(),
                }
            }
            None => Removal::NotSubscribed,
        }
    }

    /// Копия коллекции подписчиков темы для безопасной итерации.
    pub(crate) fn snapshot(
        &self,
        topic: &str,
    ) -> Vec<SubscriberRef> {
        self.topics.get(topic).cloned().unwrap_or_default()
    }

    pub(crate) fn count(
        &self,
        topic: &str,
    ) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }

    pub(crate) fn topics(&self) -> Vec<String> {
        self.topics.keys().cloned().collect()
    }

    /// Тема → строки идентичности подписчиков.
    pub(crate) fn listing(&self) -> BTreeMap<String, Vec<String>> {
        self.topics
            .iter()
            .map(|(topic, subs)| (topic.clone(), subs.iter().map(identity).collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tidings_error::DeliveryError;

    use super::*;
    use crate::router::{Message, Subscriber};

    struct Noop;

    impl Subscriber for Noop {
        fn deliver(
            &self,
            _message: &Message,
        ) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn sub() -> SubscriberRef {
        Arc::new(Noop)
    }

    /// Тест проверяет, что повторная подписка не создаёт дубликат.
    #[test]
    fn test_add_is_idempotent() {
        let mut reg = Registry::default();
        let a = sub();
        assert!(reg.add("t", &a));
        assert!(!reg.add("t", &Arc::clone(&a)));
        assert_eq!(reg.count("t"), 1);
    }

    /// Тест проверяет, что разные экземпляры одного типа считаются разными
    /// подписчиками.
    #[test]
    fn test_distinct_instances() {
        let mut reg = Registry::default();
        reg.add("t", &sub());
        reg.add("t", &sub());
        assert_eq!(reg.count("t"), 2);
    }

    /// Тест проверяет все исходы удаления и сохранение пустой темы.
    #[test]
    fn test_remove_outcomes() {
        let mut reg = Registry::default();
        let a = sub();
        let b = sub();

        assert_eq!(reg.remove("t", &a), Removal::UnknownTopic);

        reg.add("t", &a);
        reg.add("t", &b);
        assert_eq!(reg.remove("t", &a), Removal::Removed { now_empty: false });
        assert_eq!(reg.remove("t", &a), Removal::NotSubscribed);
        assert_eq!(reg.remove("t", &b), Removal::Removed { now_empty: true });

        assert_eq!(reg.topics(), vec!["t".to_string()]);
        assert_eq!(reg.count("t"), 0);
    }

    /// Тест проверяет, что снимок не меняется при изменении реестра.
    #[test]
    fn test_snapshot_independent() {
        let mut reg = Registry::default();
        let a = sub();
        reg.add("t", &a);
        let snap = reg.snapshot("t");
        reg.add("t", &sub());
        reg.remove("t", &a);
        assert_eq!(snap.len(), 1);
        assert!(same_subscriber(&snap[0], &a));
        assert!(reg.snapshot("missing").is_empty());
    }

    /// Тест проверяет листинг строк идентичности.
    #[test]
    fn test_listing() {
        let mut reg = Registry::default();
        let a = sub();
        reg.add("b-topic", &a);
        reg.add("a-topic", &a);
        let listing = reg.listing();
        let topics: Vec<_> = listing.keys().cloned().collect();
        assert_eq!(topics, vec!["a-topic", "b-topic"]);
        assert_eq!(listing["a-topic"], vec![identity(&a)]);
    }
}
