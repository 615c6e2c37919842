//! Registry dump records.

/// Number of fields in a well-formed registry line.
pub const FIELD_COUNT: usize = 6;

/// Separator used inside the multi-valued address and URL fields.
pub const LIST_SEPARATOR: &str = " | ";

/// One blocked resource from the registry dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// IP literals and CIDR networks, in dump order
    pub addresses: Vec<String>,
    /// Domain name, possibly with wildcards, possibly empty
    pub domain: String,
    /// Blocked URLs, in dump order
    pub urls: Vec<String>,
    /// Department that blocked the resource
    pub authority: String,
    /// Field with no known meaning, passed through verbatim
    pub unclassified: String,
    /// Date the record was added, as written in the dump
    pub date_added: String,
}

impl Record {
    /// Build a record from the fields of one parsed line.
    ///
    /// Returns `None` unless there are exactly [`FIELD_COUNT`] fields. Field
    /// order is addresses, domain, URLs, authority, unclassified, date.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Option<Self> {
        match fields {
            [addresses, domain, urls, authority, unclassified, date_added] => Some(Self {
                addresses: split_list(addresses.as_ref()),
                domain: domain.as_ref().to_string(),
                urls: split_list(urls.as_ref()),
                authority: authority.as_ref().to_string(),
                unclassified: unclassified.as_ref().to_string(),
                date_added: date_added.as_ref().to_string(),
            }),
            _ => None,
        }
    }
}

/// Split a multi-valued field on [`LIST_SEPARATOR`], dropping empty components.
///
/// An empty field yields an empty list, never a list with one empty string.
pub fn split_list(field: &str) -> Vec<String> {
    field
        .split(LIST_SEPARATOR)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
