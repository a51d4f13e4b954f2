use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::Result;

/// Poll function of a single cursor primitive, as selected by a
/// [`DualModeCursor`](crate::DualModeCursor) at construction.
pub(crate) type PollFn<C, T> = fn(Pin<&mut C>, &mut Context<'_>) -> Poll<Result<T>>;

/**
Future of one cursor primitive

Returned by [`DualModeCursor::read`], [`DualModeCursor::move_to_content`],
[`DualModeCursor::skip`] and [`DualModeCursor::get_value`]. In
[`ExecutionMode::Immediate`] it is ready on the first poll.

   [`DualModeCursor::read`]: crate::DualModeCursor::read
   [`DualModeCursor::move_to_content`]: crate::DualModeCursor::move_to_content
   [`DualModeCursor::skip`]: crate::DualModeCursor::skip
   [`DualModeCursor::get_value`]: crate::DualModeCursor::get_value
   [`ExecutionMode::Immediate`]: crate::ExecutionMode::Immediate
*/
#[must_use = "futures do nothing unless polled"]
pub struct Primitive<'a, C: ?Sized, T> {
	cursor: &'a mut C,
	poll: PollFn<C, T>,
}

impl<'a, C: ?Sized, T> Primitive<'a, C, T> {
	pub(crate) fn new(cursor: &'a mut C, poll: PollFn<C, T>) -> Self {
		Self { cursor, poll }
	}
}

impl<C: ?Sized, T> fmt::Debug for Primitive<'_, C, T> {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Primitive").finish()
	}
}

impl<C: Unpin + ?Sized, T> Future for Primitive<'_, C, T> {
	type Output = Result<T>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<T>> {
		let this = self.get_mut();
		(this.poll)(Pin::new(&mut *this.cursor), cx)
	}
}
