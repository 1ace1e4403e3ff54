use crate::pagination::page::Page;
use async_trait::async_trait;

/// Forward-only walk over a paginated listing.
///
/// Implementations fetch strictly one page at a time: the next request is
/// only built once the previous page's continuation is known.
#[async_trait]
pub trait Paginator: Send {
    type Item: Send;
    type Error: Send;

    /// Whether another call to [`Paginator::next_page`] may yield data.
    fn has_next(&self) -> bool;

    async fn next_page(&mut self) -> Result<Page<Self::Item>, Self::Error>;
}

/// Pulls every remaining page and concatenates the items in page order.
pub async fn drain<P>(paginator: &mut P) -> Result<Vec<P::Item>, P::Error>
where
    P: Paginator + ?Sized,
{
    let mut items = Vec::new();
    while paginator.has_next() {
        let page = paginator.next_page().await?;
        items.extend(page.items);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::continuation::ContinuationToken;

    /// Serves fixed chunks and records the continuation it was asked for.
    struct ChunkPaginator {
        chunks: Vec<Vec<u32>>,
        next: usize,
        seen_tokens: Vec<Option<ContinuationToken>>,
        token: Option<ContinuationToken>,
        started: bool,
        fail_at: Option<usize>,
    }

    impl ChunkPaginator {
        fn new(chunks: Vec<Vec<u32>>) -> Self {
            Self {
                chunks,
                next: 0,
                seen_tokens: Vec::new(),
                token: None,
                started: false,
                fail_at: None,
            }
        }
    }

    #[async_trait]
    impl Paginator for ChunkPaginator {
        type Item = u32;
        type Error = String;

        fn has_next(&self) -> bool {
            !self.started || self.token.is_some()
        }

        async fn next_page(&mut self) -> Result<Page<u32>, String> {
            if self.fail_at == Some(self.next) {
                return Err(format!("boom at page {}", self.next));
            }
            self.started = true;
            self.seen_tokens.push(self.token.clone());

            let items = self.chunks.get(self.next).cloned().unwrap_or_default();
            self.next += 1;
            let page = if self.next < self.chunks.len() {
                Page::with_continuation(items, ContinuationToken::new(self.next.to_string()))
            } else {
                Page::last(items)
            };
            self.token = page.continuation.clone();
            Ok(page)
        }
    }

    #[tokio::test]
    async fn test_drain_follows_continuations_in_order() {
        let mut p = ChunkPaginator::new(vec![vec![1, 2], vec![], vec![3], vec![4, 5]]);
        let items = drain(&mut p).await.unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            p.seen_tokens,
            vec![
                None,
                Some(ContinuationToken::new("1")),
                Some(ContinuationToken::new("2")),
                Some(ContinuationToken::new("3")),
            ]
        );
        assert!(!p.has_next());
    }

    #[tokio::test]
    async fn test_drain_single_empty_page() {
        let mut p = ChunkPaginator::new(vec![]);
        assert!(drain(&mut p).await.unwrap().is_empty());
        assert_eq!(p.seen_tokens.len(), 1);
    }

    #[tokio::test]
    async fn test_drain_propagates_errors() {
        let mut p = ChunkPaginator::new(vec![vec![1], vec![2], vec![3]]);
        p.fail_at = Some(2);
        assert_eq!(drain(&mut p).await, Err("boom at page 2".to_string()));
    }
}
