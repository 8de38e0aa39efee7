//! The fixed structural vocabulary of the surface syntax.

/// Structural element names, decoded once per event so transitions dispatch
/// on a closed enumeration instead of repeated string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementName {
    DicomAttribute,
    Item,
    Value,
    PersonName,
    Alphabetic,
    Ideographic,
    Phonetic,
    FamilyName,
    GivenName,
    MiddleName,
    NamePrefix,
    NameSuffix,
    BulkDataLocator,
    DataFragment,
    Uri,
    TransferSyntax,
    Offset,
    Length,
}

impl ElementName {
    /// Decode an element name; unknown names are structural noise.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "DicomAttribute" => Self::DicomAttribute,
            "Item" => Self::Item,
            "Value" => Self::Value,
            "PersonName" => Self::PersonName,
            "Alphabetic" => Self::Alphabetic,
            "Ideographic" => Self::Ideographic,
            "Phonetic" => Self::Phonetic,
            "FamilyName" => Self::FamilyName,
            "GivenName" => Self::GivenName,
            "MiddleName" => Self::MiddleName,
            "NamePrefix" => Self::NamePrefix,
            "NameSuffix" => Self::NameSuffix,
            "BulkDataLocator" => Self::BulkDataLocator,
            "DataFragment" => Self::DataFragment,
            "URI" => Self::Uri,
            "TransferSyntax" => Self::TransferSyntax,
            "Offset" => Self::Offset,
            "Length" => Self::Length,
            _ => return None,
        })
    }
}
