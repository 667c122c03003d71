//! Container and markup plumbing shared by the spreadsheet sources.
pub(crate) mod xml;
pub(crate) mod zip;
