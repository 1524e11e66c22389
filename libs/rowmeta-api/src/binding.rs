use crate::accessor::Accessor;

/// Typed struct ↔ named-column mapping.
///
/// Usually derived with `#[derive(RowBinding)]`; see the derive for the
/// supported attributes. Reading is soft: every field falls back to its
/// `Default` value when the column is missing, null or of another type.
pub trait RowBinding: Sized {
    /// Column names this type reads and writes, in field order.
    fn column_names() -> Vec<&'static str>;

    fn read_from<A: Accessor>(source: &A) -> Self;

    fn write_to<A: Accessor>(&self, target: &mut A);
}
