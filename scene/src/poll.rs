use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

/// Poll a boxed future exactly once from a synchronous frame tick.
///
/// The waker does nothing: the render loop polls again on the next frame
/// regardless of whether anything woke it.
pub(crate) fn poll_once<F>(future: &mut Pin<Box<F>>) -> Poll<F::Output>
where
    F: Future + ?Sized,
{
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    future.as_mut().poll(&mut cx)
}

fn noop_waker() -> Waker {
    fn noop(_: *const ()) {}
    fn clone(p: *const ()) -> RawWaker {
        RawWaker::new(p, &VTABLE)
    }
    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
    // SAFETY: every vtable entry ignores the data pointer.
    unsafe { Waker::from_raw(RawWaker::new(std::ptr::null(), &VTABLE)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_future_completes_on_first_poll() {
        let mut fut: Pin<Box<dyn Future<Output = u32> + Send>> = Box::pin(async { 7 });
        assert_eq!(poll_once(&mut fut), Poll::Ready(7));
    }

    #[test]
    fn pending_future_stays_pending() {
        let mut fut = Box::pin(std::future::pending::<()>());
        assert_eq!(poll_once(&mut fut), Poll::Pending);
    }
}
