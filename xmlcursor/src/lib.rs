/*!
# Dual-mode XML cursor adapter

This crate wraps a forward-only XML token cursor and offers one set of
operations on top of it, whether the cursor blocks or suspends while waiting
for input.

## Features

* Execution mode (immediate or suspendable) fixed once per
  [`DualModeCursor`] and never re-checked
* Composite reads built only from cursor primitives: start/end tag
  consumption, start tag tests, text accumulation and simple-content
  element text
* Copying of a node and its subtree to a write [`Sink`] via [`NodeCopier`]
* An in-memory cursor backend ([`MemoryCursor`]) and an XML serializing
  sink ([`Encoder`])

The tokenizer itself is not part of this crate. Any type implementing
[`Cursor`] can be wrapped.

## Example

```
use xmlcursor::{Document, DualModeCursor, MemoryCursor};

# tokio_test::block_on(async {
let doc = Document::builder()
	.start("note")
	.start("to")
	.text("Tove")
	.end()
	.end()
	.build()
	.unwrap();
let mut inner = MemoryCursor::suspendable(doc);
let mut cursor = DualModeCursor::wrap(&mut inner);
cursor.read_start_element_named("note").await.unwrap();
assert_eq!(cursor.read_element_string_named("to").await.unwrap(), "Tove");
cursor.read_end_element().await.unwrap();
# });
```

## Implementing a backend

A backend implements [`CursorState`] for inspection and attribute navigation
and [`Cursor`] for the primitives. Blocking backends only need
[`Cursor::read`]; everything else has a default. Backends which can wait for
input without blocking report [`ExecutionMode::Suspendable`] from
[`Cursor::execution_mode`] and implement the `poll_*` methods.
*/
pub mod copy;
pub mod cursor;
mod element;
pub mod error;
mod future;
pub mod memory;
pub mod node;
mod wrapper;
pub mod writer;


#[doc(inline)]
pub use copy::{CopyOptions, NodeCopier};
#[doc(inline)]
pub use cursor::{Cursor, CursorState, ExecutionMode};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use future::Primitive;
#[doc(inline)]
pub use memory::{Document, DocumentBuilder, MemoryCursor};
#[doc(inline)]
pub use node::{NodeType, NodeTypeSet, ReadState};
#[doc(inline)]
pub use wrapper::DualModeCursor;
#[doc(inline)]
pub use writer::{Encoder, Sink};

/// Package version
pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
