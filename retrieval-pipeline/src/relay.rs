use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::error;

use common::utils::generation::FragmentStream;

/// Forwards generated fragments to the caller as they arrive, without
/// buffering the full response.
///
/// A fault mid-stream is downgraded to one final `Error: ...` fragment and a
/// clean end: by the time a fragment has been sent the transport has already
/// committed a success status, so the fault must not surface as a transport
/// failure. Faults before the first fragment are the caller's to handle.
pub fn relay_fragments(fragments: FragmentStream) -> impl Stream<Item = String> + Send {
    stream! {
        let mut fragments = fragments;
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => yield fragment,
                Err(e) => {
                    error!("generation stream failed mid-flight: {e}");
                    yield format!("Error: {e}");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::AppError;

    fn boxed(items: Vec<Result<String, AppError>>) -> FragmentStream {
        Box::pin(futures::stream::iter(items))
    }

    #[tokio::test]
    async fn test_fragments_pass_through_in_order() {
        let relay = relay_fragments(boxed(vec![
            Ok("Hello ".into()),
            Ok("world".into()),
        ]));

        let collected: Vec<String> = relay.collect().await;

        assert_eq!(collected, vec!["Hello ".to_owned(), "world".to_owned()]);
    }

    #[tokio::test]
    async fn test_mid_stream_fault_becomes_trailing_marker() {
        let relay = relay_fragments(boxed(vec![
            Ok("partial ".into()),
            Err(AppError::InternalError("upstream hung up".into())),
            Ok("never delivered".into()),
        ]));

        let collected: Vec<String> = relay.collect().await;

        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0], "partial ");
        assert!(collected[1].starts_with("Error: "));
        assert!(collected[1].contains("upstream hung up"));
    }

    #[tokio::test]
    async fn test_empty_stream_ends_cleanly() {
        let relay = relay_fragments(boxed(Vec::new()));

        let collected: Vec<String> = relay.collect().await;

        assert!(collected.is_empty());
    }
}
