//! GST (goods and services tax) registration classification.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use partyhub_core::DomainError;

/// Tax registration type of a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GstType {
    Registered,
    RegisteredComposition,
    Unregistered,
    Consumer,
    Overseas,
    SpecialEconomicZone,
    DeemedExport,
    TaxDeductor,
    SezDeveloper,
}

/// Display metadata for a GST type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GstTypeInfo {
    pub title: &'static str,
    pub subtitle: &'static str,
    /// Whether parties of this type are expected to carry a GSTIN.
    pub is_gstin: bool,
    pub enum_value: GstType,
}

pub const GST_TYPES: [GstTypeInfo; 9] = [
    GstTypeInfo {
        title: "Registered Business - Regular",
        subtitle: "Business that is registered under GST",
        is_gstin: true,
        enum_value: GstType::Registered,
    },
    GstTypeInfo {
        title: "Registered Business - Composition",
        subtitle: "Business that is registered under the Composition Scheme GST",
        is_gstin: true,
        enum_value: GstType::RegisteredComposition,
    },
    GstTypeInfo {
        title: "Unregistered Business",
        subtitle: "Business that has not been registered under GST",
        is_gstin: false,
        enum_value: GstType::Unregistered,
    },
    GstTypeInfo {
        title: "Consumer",
        subtitle: "A consumer who is a regular consumer",
        is_gstin: false,
        enum_value: GstType::Consumer,
    },
    GstTypeInfo {
        title: "Overseas",
        subtitle: "Persons with whom you do import or export of supplies outside India",
        is_gstin: false,
        enum_value: GstType::Overseas,
    },
    GstTypeInfo {
        title: "Special Economic Zone",
        subtitle: "Business (Unit) that is located in a Special Economic Zone (SEZ) of India or a SEZ Developer",
        is_gstin: true,
        enum_value: GstType::SpecialEconomicZone,
    },
    GstTypeInfo {
        title: "Deemed Export",
        subtitle: "Supply of goods to an Export Oriented Unit or against Advanced Authorization/Export Promotion Capital Goods",
        is_gstin: true,
        enum_value: GstType::DeemedExport,
    },
    GstTypeInfo {
        title: "Tax Deductor",
        subtitle: "Departments of State/Central government, governmental agencies or local authorities",
        is_gstin: true,
        enum_value: GstType::TaxDeductor,
    },
    GstTypeInfo {
        title: "SEZ Developer",
        subtitle: "A person/organization who owns at least 26% of the equity in creating business units in Special Economic Zone (SEZ)",
        is_gstin: true,
        enum_value: GstType::SezDeveloper,
    },
];

impl GstType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GstType::Registered => "REGISTERED",
            GstType::RegisteredComposition => "REGISTERED_COMPOSITION",
            GstType::Unregistered => "UNREGISTERED",
            GstType::Consumer => "CONSUMER",
            GstType::Overseas => "OVERSEAS",
            GstType::SpecialEconomicZone => "SPECIAL_ECONOMIC_ZONE",
            GstType::DeemedExport => "DEEMED_EXPORT",
            GstType::TaxDeductor => "TAX_DEDUCTOR",
            GstType::SezDeveloper => "SEZ_DEVELOPER",
        }
    }
}

impl FromStr for GstType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GST_TYPES
            .iter()
            .map(|info| info.enum_value)
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::invalid_enum("gstType", s))
    }
}

impl core::fmt::Display for GstType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_covers_each_type_once() {
        for info in GST_TYPES.iter() {
            let count = GST_TYPES
                .iter()
                .filter(|other| other.enum_value == info.enum_value)
                .count();
            assert_eq!(count, 1, "{} listed more than once", info.enum_value);
            assert_eq!(info.enum_value.as_str().parse::<GstType>().unwrap(), info.enum_value);
        }
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("SEZ_DEVELOPER".parse::<GstType>().unwrap(), GstType::SezDeveloper);
        assert_eq!(
            serde_json::to_value(GstType::RegisteredComposition).unwrap(),
            "REGISTERED_COMPOSITION"
        );
        assert!(matches!(
            "registered".parse::<GstType>(),
            Err(DomainError::InvalidEnum { field: "gstType", .. })
        ));
    }

    #[test]
    fn consumers_do_not_carry_gstin() {
        let is_gstin = |t: GstType| {
            GST_TYPES
                .iter()
                .any(|info| info.enum_value == t && info.is_gstin)
        };
        assert!(!is_gstin(GstType::Consumer));
        assert!(is_gstin(GstType::Registered));
    }
}
