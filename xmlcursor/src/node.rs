/*!
# Node kinds and reader states

Classification of the node a [`Cursor`](crate::Cursor) is currently
positioned on, plus the named kind sets the composite operations key off.
*/
use std::fmt;

/// Kind of the node a cursor is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
	/// Not positioned on a node (before the first read or after the end).
	None,
	/// Start tag, including empty-element tags.
	Element,
	/// Attribute of the current element (only while navigating attributes).
	Attribute,
	/// Character data in element content.
	Text,
	/// A `<![CDATA[…]]>` section.
	CData,
	/// An unexpanded entity reference.
	EntityReference,
	/// Entity declaration.
	Entity,
	/// Processing instruction (other than the XML declaration).
	ProcessingInstruction,
	/// Comment.
	Comment,
	/// Document root.
	Document,
	/// `<!DOCTYPE …>` declaration.
	DocumentType,
	/// Document fragment.
	DocumentFragment,
	/// Notation declaration.
	Notation,
	/// Insignificant whitespace between markup.
	Whitespace,
	/// Whitespace in mixed content or inside an `xml:space='preserve'` scope.
	SignificantWhitespace,
	/// End tag.
	EndElement,
	/// End of an expanded entity.
	EndEntity,
	/// The `<?xml …?>` declaration.
	XmlDeclaration,
}

impl fmt::Display for NodeType {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

/// Lifecycle state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadState {
	/// No node has been read yet.
	Initial,
	/// The cursor is positioned on a node.
	Interactive,
	/// A fatal error has been encountered.
	Error,
	/// The input has been exhausted.
	EndOfFile,
	/// The cursor has been closed by its owner.
	Closed,
}

/**
# Named set of node kinds

A fixed list of [`NodeType`] members. Membership is spelled out explicitly
so that adding a kind to [`NodeType`] never changes a set by accident.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTypeSet(&'static [NodeType]);

impl NodeTypeSet {
	/// Kinds whose values are concatenated by
	/// [`DualModeCursor::read_string`](crate::DualModeCursor::read_string).
	pub const TEXTUAL: NodeTypeSet = NodeTypeSet(&[
		NodeType::Text,
		NodeType::CData,
		NodeType::Whitespace,
		NodeType::SignificantWhitespace,
	]);

	/// Kinds at which [`Cursor::move_to_content`](crate::Cursor::move_to_content)
	/// stops.
	pub const CONTENT: NodeTypeSet = NodeTypeSet(&[
		NodeType::Element,
		NodeType::EndElement,
		NodeType::Text,
		NodeType::CData,
		NodeType::EntityReference,
		NodeType::EndEntity,
	]);

	/// Return true if `kind` is a member of the set.
	#[inline]
	pub fn contains(&self, kind: NodeType) -> bool {
		self.0.contains(&kind)
	}

	/// Members of the set.
	pub fn members(&self) -> &'static [NodeType] {
		self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn textual_set_is_exactly_the_four_text_kinds() {
		let all = [
			NodeType::None,
			NodeType::Element,
			NodeType::Attribute,
			NodeType::Text,
			NodeType::CData,
			NodeType::EntityReference,
			NodeType::Entity,
			NodeType::ProcessingInstruction,
			NodeType::Comment,
			NodeType::Document,
			NodeType::DocumentType,
			NodeType::DocumentFragment,
			NodeType::Notation,
			NodeType::Whitespace,
			NodeType::SignificantWhitespace,
			NodeType::EndElement,
			NodeType::EndEntity,
			NodeType::XmlDeclaration,
		];
		let textual: Vec<NodeType> = all
			.iter()
			.copied()
			.filter(|k| NodeTypeSet::TEXTUAL.contains(*k))
			.collect();
		assert_eq!(
			textual,
			vec![
				NodeType::Text,
				NodeType::CData,
				NodeType::Whitespace,
				NodeType::SignificantWhitespace,
			]
		);
	}

	#[test]
	fn content_set_excludes_markup_noise() {
		for kind in [
			NodeType::Comment,
			NodeType::ProcessingInstruction,
			NodeType::XmlDeclaration,
			NodeType::DocumentType,
			NodeType::Whitespace,
			NodeType::SignificantWhitespace,
		]
		.iter()
		{
			assert!(!NodeTypeSet::CONTENT.contains(*kind), "{}", kind);
		}
		assert!(NodeTypeSet::CONTENT.contains(NodeType::Element));
		assert!(NodeTypeSet::CONTENT.contains(NodeType::EndElement));
	}
}
