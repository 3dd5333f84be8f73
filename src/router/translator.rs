use super::Message;

/// Opaque caller-supplied transformation applied once per publish, after
/// annotation and before topic resolution.
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        message: Message,
    ) -> Message;
}

impl<F> Translator for F
where
    F: Fn(Message) -> Message + Send + Sync,
{
    fn translate(
        &self,
        message: Message,
    ) -> Message {
        self(message)
    }
}
