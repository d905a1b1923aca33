//! Structural size formulas
//!
//! Exact sizes computed from an object's shape and the runtime layout.
//! None of these include the GC header; the estimator adds it once.
//!
//! ```text
//! Sequence   basic + allocated * pointer
//! HashedSet  basic + (external table ? slots * set_entry : 0)
//! Mapping    basic + (split ? (slots * 2 / 3) * pointer : 0)
//!                  + (sole key owner ? key table bytes : 0)
//! Text       header(encoding) + (len + 1) * width
//!                  + wide cache + utf8 cache (when present, not aliased)
//! BigInt     basic + digits * digit_size
//! ```

use crate::config::RuntimeLayout;
use crate::object::{
    Category, MappingShape, ObjectShape, SetTable, TextEncoding, TextShape, TypeDescriptor,
};

/// Exact structural size, if the category has a formula and the shape matches
pub fn structural_size(
    layout: &RuntimeLayout,
    descriptor: &TypeDescriptor,
    shape: &ObjectShape<'_>,
) -> Option<usize> {
    let basic = descriptor.basic_size;
    match (descriptor.category, shape) {
        (Category::Sequence, ObjectShape::Sequence { allocated, .. }) => {
            Some(basic.saturating_add(allocated.saturating_mul(layout.pointer_size)))
        }
        (Category::HashedSet, ObjectShape::HashedSet { table, .. }) => {
            Some(basic.saturating_add(set_table_size(layout, *table)))
        }
        (Category::Mapping, ObjectShape::Mapping(mapping)) => {
            Some(basic.saturating_add(mapping_storage_size(layout, mapping)))
        }
        (Category::Text, ObjectShape::Text(text)) => Some(text_size(layout, text)),
        (Category::BigInt, ObjectShape::BigInt(int)) => {
            Some(basic.saturating_add(int.digits.len().saturating_mul(layout.digit_size)))
        }
        _ => None,
    }
}

/// Size of a set's table outside the object itself
pub fn set_table_size(layout: &RuntimeLayout, table: SetTable) -> usize {
    match table {
        SetTable::Inline => 0,
        SetTable::External { slots } => slots.saturating_mul(layout.set_entry_size),
    }
}

/// Split values array plus uniquely owned key table
///
/// A key table shared by several mappings is attributed to the type object.
pub fn mapping_storage_size(layout: &RuntimeLayout, mapping: &MappingShape) -> usize {
    let values = mapping
        .split_slots
        .map(|slots| (slots.saturating_mul(2) / 3).saturating_mul(layout.pointer_size))
        .unwrap_or(0);

    let keys = if mapping.keys.is_unique() {
        mapping.keys.bytes
    } else {
        0
    };

    values.saturating_add(keys)
}

/// Full size of a text object without GC header
pub fn text_size(layout: &RuntimeLayout, text: &TextShape<'_>) -> usize {
    let chars = text.len.saturating_add(1);

    let mut size = match text.encoding {
        TextEncoding::CompactAscii => layout.ascii_header_size.saturating_add(chars),
        TextEncoding::Compact(width) => layout
            .compact_header_size
            .saturating_add(chars.saturating_mul(width.bytes())),
        TextEncoding::Legacy(width) => {
            // Character block is a separate allocation that may be missing
            let block = if text.data.is_some() {
                chars.saturating_mul(width.bytes())
            } else {
                0
            };
            layout.legacy_header_size.saturating_add(block)
        }
    };

    if let Some(wide) = text.wide_cache.filter(|cache| !cache.aliased) {
        size = size.saturating_add(wide.len.saturating_add(1).saturating_mul(layout.wchar_size));
    }

    if text.encoding != TextEncoding::CompactAscii {
        if let Some(utf8) = text.utf8_cache.filter(|cache| !cache.aliased) {
            size = size.saturating_add(utf8.len.saturating_add(1));
        }
    }

    size
}

/// Structural fallback: basic size plus inline items
pub fn fallback_size(descriptor: &TypeDescriptor, length: usize) -> usize {
    if descriptor.is_var_sized() {
        descriptor
            .basic_size
            .saturating_add(length.saturating_mul(descriptor.item_size))
    } else {
        descriptor.basic_size
    }
}
