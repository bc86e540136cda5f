use crate::client::RowStream;
use crate::error::FluentResult;
use crate::index::ResultColumnIndex;
use crate::row::RowView;
use futures_core::Stream;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Rows of a joined query mapped through a [`RowView`] as they arrive.
///
/// Ends after the first error, whether it came from the server or the mapper.
#[must_use]
pub struct JoinedRowStream<T, F> {
    inner: RowStream,
    index: ResultColumnIndex,
    mapper: F,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> JoinedRowStream<T, F> {
    pub(crate) fn new(inner: RowStream, index: ResultColumnIndex, mapper: F) -> Self {
        Self {
            inner,
            index,
            mapper,
            done: false,
            _marker: PhantomData,
        }
    }

    /// The column index rows are read through.
    pub fn index(&self) -> &ResultColumnIndex {
        &self.index
    }
}

// No field is structurally pinned; `RowStream` boxes its own stream.
impl<T, F> Unpin for JoinedRowStream<T, F> {}

impl<T, F> Stream for JoinedRowStream<T, F>
where
    F: FnMut(&RowView<'_>) -> FluentResult<T>,
{
    type Item = FluentResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => {
                let mapped = (this.mapper)(&RowView::new(&row, &this.index));
                this.done = mapped.is_err();
                Poll::Ready(Some(mapped))
            }
            Poll::Ready(Some(Err(e))) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
