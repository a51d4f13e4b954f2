/*!
# Mode-frozen cursor adapter

[`DualModeCursor`] gives every cursor the same suspend-capable surface. The
choice between the blocking and the suspending form of each primitive is
made once, in [`DualModeCursor::wrap`], and stored as a table of function
pointers; no call afterwards looks at the mode again.
*/
use std::pin::Pin;
use std::task::{Context, Poll};

use tracing::debug;

use crate::cursor::{Cursor, CursorState, ExecutionMode};
use crate::error::{Error, Result};
use crate::future::{PollFn, Primitive};
use crate::node::{NodeType, ReadState};

fn immediate_read<C: Cursor + Unpin + ?Sized>(
	cursor: Pin<&mut C>,
	_: &mut Context<'_>,
) -> Poll<Result<bool>> {
	Poll::Ready(cursor.get_mut().read())
}

fn immediate_move_to_content<C: Cursor + Unpin + ?Sized>(
	cursor: Pin<&mut C>,
	_: &mut Context<'_>,
) -> Poll<Result<NodeType>> {
	Poll::Ready(cursor.get_mut().move_to_content())
}

fn immediate_skip<C: Cursor + Unpin + ?Sized>(
	cursor: Pin<&mut C>,
	_: &mut Context<'_>,
) -> Poll<Result<()>> {
	Poll::Ready(cursor.get_mut().skip())
}

fn immediate_get_value<C: Cursor + Unpin + ?Sized>(
	cursor: Pin<&mut C>,
	_: &mut Context<'_>,
) -> Poll<Result<String>> {
	Poll::Ready(cursor.get_mut().get_value())
}

fn suspending_read<C: Cursor + Unpin + ?Sized>(
	cursor: Pin<&mut C>,
	cx: &mut Context<'_>,
) -> Poll<Result<bool>> {
	cursor.poll_read(cx)
}

fn suspending_move_to_content<C: Cursor + Unpin + ?Sized>(
	cursor: Pin<&mut C>,
	cx: &mut Context<'_>,
) -> Poll<Result<NodeType>> {
	cursor.poll_move_to_content(cx)
}

fn suspending_skip<C: Cursor + Unpin + ?Sized>(
	cursor: Pin<&mut C>,
	cx: &mut Context<'_>,
) -> Poll<Result<()>> {
	cursor.poll_skip(cx)
}

fn suspending_get_value<C: Cursor + Unpin + ?Sized>(
	cursor: Pin<&mut C>,
	cx: &mut Context<'_>,
) -> Poll<Result<String>> {
	cursor.poll_get_value(cx)
}

/// The primitives, bound to one execution mode.
struct Bindings<C: ?Sized> {
	read: PollFn<C, bool>,
	move_to_content: PollFn<C, NodeType>,
	skip: PollFn<C, ()>,
	get_value: PollFn<C, String>,
}

impl<C: Cursor + Unpin + ?Sized> Bindings<C> {
	fn immediate() -> Self {
		Self {
			read: immediate_read::<C>,
			move_to_content: immediate_move_to_content::<C>,
			skip: immediate_skip::<C>,
			get_value: immediate_get_value::<C>,
		}
	}

	fn suspending() -> Self {
		Self {
			read: suspending_read::<C>,
			move_to_content: suspending_move_to_content::<C>,
			skip: suspending_skip::<C>,
			get_value: suspending_get_value::<C>,
		}
	}
}

/**
# Cursor adapter with a frozen execution mode

Wraps a borrowed [`Cursor`] and exposes its primitives as futures,
regardless of whether the cursor blocks or suspends. The cursor's
[`Cursor::execution_mode`] is inspected once at construction:

* [`ExecutionMode::Suspendable`]: the futures drive the cursor's `poll_*`
  methods.
* [`ExecutionMode::Immediate`]: the futures call the blocking methods and are
  ready on their first poll.

Everything else (names, values, attribute navigation) is synchronous and
available through the [`CursorState`] implementation, which forwards to the
wrapped cursor.

The composite element reads ([`read_string`](Self::read_string),
[`read_element_string`](Self::read_element_string) and friends) and the
[`NodeCopier`](crate::NodeCopier) are built on top of this type and behave
the same in both modes.

## Example

```
use xmlcursor::{Document, DualModeCursor, ExecutionMode, MemoryCursor};
# tokio_test::block_on(async {
let doc = Document::builder().start("a").text("hello").end().build().unwrap();
let mut inner = MemoryCursor::suspendable(doc);
let mut cursor = DualModeCursor::wrap(&mut inner);
assert_eq!(cursor.mode(), ExecutionMode::Suspendable);
assert_eq!(cursor.read_element_string().await.unwrap(), "hello");
# })
```
*/
pub struct DualModeCursor<'c, C: ?Sized> {
	cursor: &'c mut C,
	mode: ExecutionMode,
	bindings: Bindings<C>,
}

impl<'c, C: Cursor + Unpin + ?Sized> DualModeCursor<'c, C> {
	/// Wrap a cursor which may be absent.
	///
	/// Fails with [`Error::InvalidArgument`] if `cursor` is `None`.
	pub fn new(cursor: Option<&'c mut C>) -> Result<Self> {
		match cursor {
			Some(cursor) => Ok(Self::wrap(cursor)),
			None => Err(Error::InvalidArgument("cursor")),
		}
	}

	/// Wrap a cursor, binding its primitives to its declared execution
	/// mode.
	pub fn wrap(cursor: &'c mut C) -> Self {
		let mode = cursor.execution_mode();
		let bindings = match mode {
			ExecutionMode::Immediate => Bindings::immediate(),
			ExecutionMode::Suspendable => Bindings::suspending(),
		};
		debug!(?mode, "bound cursor primitives");
		Self {
			cursor,
			mode,
			bindings,
		}
	}

	/// Obtain the value of the current node.
	pub fn get_value(&mut self) -> Primitive<'_, C, String> {
		Primitive::new(&mut *self.cursor, self.bindings.get_value)
	}

	/// Skip non-content nodes and report the kind of the node reached.
	///
	/// See [`Cursor::move_to_content`].
	pub fn move_to_content(&mut self) -> Primitive<'_, C, NodeType> {
		Primitive::new(&mut *self.cursor, self.bindings.move_to_content)
	}

	/// Skip the current node and its children.
	pub fn skip(&mut self) -> Primitive<'_, C, ()> {
		Primitive::new(&mut *self.cursor, self.bindings.skip)
	}

	/// Advance by one node. Resolves to false once the input is exhausted.
	pub fn read(&mut self) -> Primitive<'_, C, bool> {
		Primitive::new(&mut *self.cursor, self.bindings.read)
	}
}

impl<'c, C: ?Sized> DualModeCursor<'c, C> {
	/// The execution mode chosen at construction.
	pub fn mode(&self) -> ExecutionMode {
		self.mode
	}

	/// Access the wrapped cursor
	pub fn get_ref(&self) -> &C {
		&*self.cursor
	}

	/// Access the wrapped cursor, mutably
	pub fn get_mut(&mut self) -> &mut C {
		&mut *self.cursor
	}

	/// Release the borrow of the wrapped cursor.
	pub fn into_inner(self) -> &'c mut C {
		self.cursor
	}
}

impl<C: CursorState + ?Sized> CursorState for DualModeCursor<'_, C> {
	fn node_type(&self) -> NodeType {
		self.cursor.node_type()
	}

	fn name(&self) -> &str {
		self.cursor.name()
	}

	fn local_name(&self) -> &str {
		self.cursor.local_name()
	}

	fn namespace_uri(&self) -> &str {
		self.cursor.namespace_uri()
	}

	fn prefix(&self) -> &str {
		self.cursor.prefix()
	}

	fn value(&self) -> &str {
		self.cursor.value()
	}

	fn depth(&self) -> usize {
		self.cursor.depth()
	}

	fn base_uri(&self) -> &str {
		self.cursor.base_uri()
	}

	fn is_empty_element(&self) -> bool {
		self.cursor.is_empty_element()
	}

	fn is_default(&self) -> bool {
		self.cursor.is_default()
	}

	fn attribute_count(&self) -> usize {
		self.cursor.attribute_count()
	}

	fn eof(&self) -> bool {
		self.cursor.eof()
	}

	fn read_state(&self) -> ReadState {
		self.cursor.read_state()
	}

	fn get_attribute(&self, name: &str) -> Option<&str> {
		self.cursor.get_attribute(name)
	}

	fn get_attribute_ns(&self, local_name: &str, namespace_uri: &str) -> Option<&str> {
		self.cursor.get_attribute_ns(local_name, namespace_uri)
	}

	fn get_attribute_at(&self, index: usize) -> Option<&str> {
		self.cursor.get_attribute_at(index)
	}

	fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
		self.cursor.lookup_namespace(prefix)
	}

	fn move_to_attribute(&mut self, name: &str) -> bool {
		self.cursor.move_to_attribute(name)
	}

	fn move_to_attribute_ns(&mut self, local_name: &str, namespace_uri: &str) -> bool {
		self.cursor.move_to_attribute_ns(local_name, namespace_uri)
	}

	fn move_to_attribute_at(&mut self, index: usize) -> bool {
		self.cursor.move_to_attribute_at(index)
	}

	fn move_to_element(&mut self) -> bool {
		self.cursor.move_to_element()
	}

	fn move_to_first_attribute(&mut self) -> bool {
		self.cursor.move_to_first_attribute()
	}

	fn move_to_next_attribute(&mut self) -> bool {
		self.cursor.move_to_next_attribute()
	}

	fn read_attribute_value(&mut self) -> bool {
		self.cursor.read_attribute_value()
	}

	fn resolve_entity(&mut self) -> Result<()> {
		self.cursor.resolve_entity()
	}

	fn can_read_value_chunk(&self) -> bool {
		self.cursor.can_read_value_chunk()
	}

	fn read_value_chunk(&mut self, buf: &mut [char]) -> Result<usize> {
		self.cursor.read_value_chunk(buf)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use tokio_test::{assert_pending, assert_ready_ok};

	use crate::memory::{Document, MemoryCursor};
	use crate::tests::Flaky;

	fn doc() -> Document {
		Document::builder()
			.comment("c")
			.start("a")
			.attr("k", "v")
			.text("t")
			.end()
			.build()
			.unwrap()
	}

	#[test]
	fn absent_cursor_is_rejected() {
		let r = DualModeCursor::<MemoryCursor>::new(None);
		assert!(matches!(r, Err(Error::InvalidArgument("cursor"))));
	}

	#[test]
	fn mode_follows_declared_capability() {
		let mut inner = MemoryCursor::new(doc());
		assert_eq!(DualModeCursor::wrap(&mut inner).mode(), ExecutionMode::Immediate);
		let mut inner = MemoryCursor::suspendable(doc());
		assert_eq!(
			DualModeCursor::new(Some(&mut inner)).unwrap().mode(),
			ExecutionMode::Suspendable
		);
	}

	#[test]
	fn immediate_primitives_are_ready_on_first_poll() {
		let mut inner = MemoryCursor::new(doc());
		let mut cursor = DualModeCursor::wrap(&mut inner);
		assert_eq!(
			assert_ready_ok!(tokio_test::task::spawn(cursor.move_to_content()).poll()),
			NodeType::Element
		);
		assert_eq!(
			assert_ready_ok!(tokio_test::task::spawn(cursor.read()).poll()),
			true
		);
		assert_eq!(
			assert_ready_ok!(tokio_test::task::spawn(cursor.get_value()).poll()),
			"t"
		);
		assert_ready_ok!(tokio_test::task::spawn(cursor.skip()).poll());
		assert_eq!(cursor.node_type(), NodeType::EndElement);
		assert_eq!(inner.suspensions(), 0);
	}

	#[test]
	fn suspendable_primitives_suspend_before_completing() {
		let mut inner = MemoryCursor::suspendable(doc());
		let mut cursor = DualModeCursor::wrap(&mut inner);
		{
			let mut fut = tokio_test::task::spawn(cursor.move_to_content());
			assert_pending!(fut.poll());
			assert!(fut.is_woken());
			assert_eq!(assert_ready_ok!(fut.poll()), NodeType::Element);
		}
		{
			let mut fut = tokio_test::task::spawn(cursor.read());
			assert_pending!(fut.poll());
			assert_eq!(assert_ready_ok!(fut.poll()), true);
		}
		assert_eq!(cursor.get_ref().suspensions(), 2);
	}

	#[test]
	fn accessors_pass_through_synchronously() {
		let mut inner = MemoryCursor::suspendable(doc()).base_uri("file:///doc.xml");
		let mut cursor = DualModeCursor::wrap(&mut inner);
		assert_eq!(cursor.read_state(), ReadState::Initial);
		tokio_test::block_on(cursor.move_to_content()).unwrap();
		assert_eq!(cursor.name(), "a");
		assert_eq!(cursor.local_name(), "a");
		assert_eq!(cursor.prefix(), "");
		assert_eq!(cursor.namespace_uri(), "");
		assert_eq!(cursor.depth(), 0);
		assert_eq!(cursor.base_uri(), "file:///doc.xml");
		assert_eq!(cursor.attribute_count(), 1);
		assert_eq!(cursor.get_attribute("k"), Some("v"));
		assert_eq!(cursor.get_attribute_ns("k", ""), Some("v"));
		assert_eq!(cursor.get_attribute_at(0), Some("v"));
		assert_eq!(cursor.lookup_namespace("xml"), Some(crate::memory::XMLNS_XML));
		assert!(cursor.move_to_attribute("k"));
		assert_eq!(cursor.value(), "v");
		assert!(cursor.read_attribute_value());
		assert!(cursor.move_to_element());
		assert!(!cursor.is_empty_element());
		assert!(!cursor.eof());
		// none of the above may have gone through the suspending primitives
		assert_eq!(cursor.get_ref().suspensions(), 1);
	}

	#[test]
	fn cursor_errors_pass_through_unchanged() {
		let mut inner = MemoryCursor::new(doc()).value_chunks(false);
		let mut cursor = DualModeCursor::wrap(&mut inner);
		let mut buf = ['\0'; 8];
		assert_eq!(
			cursor.read_value_chunk(&mut buf[..]),
			Err(Error::Unsupported("read_value_chunk"))
		);
	}

	#[test]
	fn primitive_failures_pass_through_unchanged() {
		for mode in [ExecutionMode::Immediate, ExecutionMode::Suspendable].iter() {
			let mut inner = Flaky::new(MemoryCursor::with_mode(doc(), *mode)).fail_read_at(3);
			let expected = inner.error();
			let mut cursor = DualModeCursor::wrap(&mut inner);
			assert_eq!(cursor.mode(), *mode);
			assert_eq!(tokio_test::block_on(cursor.move_to_content()), Ok(NodeType::Element));
			assert_eq!(tokio_test::block_on(cursor.skip()), Err(expected));
			assert_eq!(cursor.node_type(), NodeType::Element);
			assert_eq!(tokio_test::block_on(cursor.read()), Ok(true));
			assert_eq!(cursor.node_type(), NodeType::Text);
		}
	}
}
