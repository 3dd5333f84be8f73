//! Сериализующий сервис поверх [`MessageRouter`].
//!
//! Одна tokio-задача владеет маршрутизатором и применяет команды строго по
//! одной в порядке поступления. Команды идут через ограниченную очередь
//! `mpsc`, ответы возвращаются через `oneshot`.

use std::{collections::BTreeSet, sync::Arc};

use tidings_error::{RouterError, RouterResult};
use tokio::sync::{mpsc, oneshot};
use tracing::Level;

use crate::router::{Message, MessageRouter, Stats, SubscriberRef, Topics};

enum Command {
    Publish {
        message: Message,
        level: Level,
        reply: oneshot::Sender<RouterResult<()>>,
    },
    Subscribe {
        topics: Topics,
        subscriber: SubscriberRef,
        reply: oneshot::Sender<RouterResult<()>>,
    },
    Unsubscribe {
        topic: String,
        subscriber: SubscriberRef,
        reply: oneshot::Sender<RouterResult<()>>,
    },
    Stats {
        reply: oneshot::Sender<Stats>,
    },
    DeadTopics {
        reply: oneshot::Sender<BTreeSet<String>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Фоновая задача, владеющая маршрутизатором.
pub struct RouterService {
    router: Arc<MessageRouter>,
    commands: mpsc::Receiver<Command>,
}

impl RouterService {
    /// Запускает задачу и возвращает handle для отправки команд.
    ///
    /// Должна вызываться внутри tokio runtime. `capacity` задаёт размер
    /// очереди команд (не меньше 1).
    pub fn spawn(
        router: Arc<MessageRouter>,
        capacity: usize,
    ) -> RouterHandle {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let service = Self {
            router,
            commands: rx,
        };
        tokio::spawn(service.run());
        RouterHandle { commands: tx }
    }

    async fn run(mut self) {
        tracing::info!("router service started");
        while let Some(command) = self.commands.recv().await {
            if !self.apply(command) {
                break;
            }
        }
        // Команды, оставшиеся в очереди, отбрасываются вместе с их
        // oneshot-отправителями.
        self.commands.close();
        tracing::info!("router service stopped");
    }

    /// Применяет одну команду; `false` означает остановку.
    fn apply(
        &self,
        command: Command,
    ) -> bool {
        // Ответ может быть никому не нужен, если вызывающий отменил future.
        match command {
            Command::Publish {
                message,
                level,
                reply,
            } => {
                let _ = reply.send(self.router.publish_with_level(message, level));
            }
            Command::Subscribe {
                topics,
                subscriber,
                reply,
            } => {
                let _ = reply.send(self.router.subscribe(topics, subscriber));
            }
            Command::Unsubscribe {
                topic,
                subscriber,
                reply,
            } => {
                let _ = reply.send(self.router.unsubscribe(&topic, &subscriber));
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.router.stats());
            }
            Command::DeadTopics { reply } => {
                let _ = reply.send(self.router.dead_topics());
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
                return false;
            }
        }
        true
    }
}

/// Клонируемый handle к [`RouterService`].
#[derive(Clone)]
pub struct RouterHandle {
    commands: mpsc::Sender<Command>,
}

impl RouterHandle {
    pub async fn publish(
        &self,
        message: Message,
    ) -> RouterResult<()> {
        self.publish_with_level(message, Level::INFO).await
    }

    pub async fn publish_with_level(
        &self,
        message: Message,
        level: Level,
    ) -> RouterResult<()> {
        self.request(|reply| Command::Publish {
            message,
            level,
            reply,
        })
        .await?
    }

    pub async fn subscribe(
        &self,
        topics: impl Into<Topics>,
        subscriber: SubscriberRef,
    ) -> RouterResult<()> {
        let topics = topics.into();
        self.request(|reply| Command::Subscribe {
            topics,
            subscriber,
            reply,
        })
        .await?
    }

    pub async fn unsubscribe(
        &self,
        topic: impl Into<String>,
        subscriber: SubscriberRef,
    ) -> RouterResult<()> {
        let topic = topic.into();
        self.request(|reply| Command::Unsubscribe {
            topic,
            subscriber,
            reply,
        })
        .await?
    }

    pub async fn stats(&self) -> RouterResult<Stats> {
        self.request(|reply| Command::Stats { reply }).await
    }

    pub async fn dead_topics(&self) -> RouterResult<BTreeSet<String>> {
        self.request(|reply| Command::DeadTopics { reply }).await
    }

    /// Останавливает сервис после уже принятых команд.
    pub async fn shutdown(&self) -> RouterResult<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// `true`, если задача сервиса завершилась.
    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> RouterResult<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| RouterError::ServiceStopped)?;
        rx.await.map_err(|_| RouterError::ServiceStopped)
    }
}
