use serde::{Deserialize, Serialize};

use partyhub_parties::{
    AddressPair, CreateParty, GstType, ListQuery, Page, PageInfo, PartyListItem, PartyPatch,
    PartyType, SoftDeleteParties,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------
//
// Every field is optional at the serde level: absent and blank values are reported
// together as missing parameters.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartyRequest {
    pub store_id: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    #[serde(rename = "type")]
    pub party_type: Option<String>,
    pub gst_type: Option<String>,
    pub address: Option<AddressPair>,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub gstin: Option<String>,
    pub balance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartyRequest {
    pub party_id: Option<String>,
    #[serde(rename = "type")]
    pub party_type: Option<String>,
    pub name: Option<String>,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub gstin: Option<String>,
    pub gst_type: Option<String>,
    pub balance: Option<f64>,
    pub address: Option<AddressPair>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePartiesRequest {
    pub store_id: Option<String>,
    #[serde(rename = "type")]
    pub party_type: Option<String>,
    pub party_ids: Option<Vec<String>>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn missing_fields<'a>(fields: &[(&'a str, bool)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| *name)
        .collect()
}

fn parse_gst_type(raw: &str) -> Result<GstType, axum::response::Response> {
    raw.trim()
        .parse::<GstType>()
        .map_err(errors::domain_error_to_response)
}

impl CreatePartyRequest {
    pub fn into_command(self) -> Result<CreateParty, axum::response::Response> {
        let missing = missing_fields(&[
            ("storeId", present(&self.store_id)),
            ("name", present(&self.name)),
            ("phoneNumber", present(&self.phone_number)),
            ("type", present(&self.party_type)),
            ("gstType", present(&self.gst_type)),
        ]);
        if !missing.is_empty() {
            return Err(errors::missing_parameters(&missing));
        }

        let party_type = errors::parse_party_type(self.party_type.as_deref().unwrap_or_default())?;
        let store_id = errors::parse_store_id(self.store_id.as_deref().unwrap_or_default())?;
        let gst_type = parse_gst_type(self.gst_type.as_deref().unwrap_or_default())?;

        Ok(CreateParty {
            party_type,
            store_id,
            name: self.name.unwrap_or_default().trim().to_string(),
            phone_number: self.phone_number.unwrap_or_default().trim().to_string(),
            gst_type,
            address: self.address,
            trade_name: self.trade_name,
            email: self.email,
            gstin: self.gstin,
            balance: self.balance,
        })
    }
}

/// A validated update: which record, which family, and the fields to overwrite.
#[derive(Debug)]
pub struct PartyUpdate {
    pub party_id: partyhub_core::PartyId,
    pub party_type: PartyType,
    pub patch: PartyPatch,
}

impl UpdatePartyRequest {
    pub fn into_update(self) -> Result<PartyUpdate, axum::response::Response> {
        let missing = missing_fields(&[
            ("partyId", present(&self.party_id)),
            ("type", present(&self.party_type)),
        ]);
        if !missing.is_empty() {
            return Err(errors::missing_parameters(&missing));
        }

        let party_type = errors::parse_party_type(self.party_type.as_deref().unwrap_or_default())?;
        let party_id = errors::parse_party_id(self.party_id.as_deref().unwrap_or_default())?;
        let gst_type = match self.gst_type.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(parse_gst_type(raw)?),
            _ => None,
        };

        Ok(PartyUpdate {
            party_id,
            party_type,
            patch: PartyPatch {
                name: self.name,
                trade_name: self.trade_name,
                email: self.email,
                gstin: self.gstin,
                gst_type,
                balance: self.balance,
                address: self.address,
            },
        })
    }
}

impl DeletePartiesRequest {
    pub fn into_command(self) -> Result<SoftDeleteParties, axum::response::Response> {
        let has_ids = self.party_ids.as_ref().is_some_and(|ids| !ids.is_empty());
        let missing = missing_fields(&[
            ("storeId", present(&self.store_id)),
            ("type", present(&self.party_type)),
            ("partyIds", has_ids),
        ]);
        if !missing.is_empty() {
            return Err(errors::missing_parameters(&missing));
        }

        let party_type = errors::parse_party_type(self.party_type.as_deref().unwrap_or_default())?;
        let store_id = errors::parse_store_id(self.store_id.as_deref().unwrap_or_default())?;
        let party_ids = self
            .party_ids
            .unwrap_or_default()
            .iter()
            .map(|id| errors::parse_party_id(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SoftDeleteParties {
            party_type,
            store_id,
            party_ids,
        })
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PartyListResponse {
    pub parties: Vec<PartyListItem>,
    pub pagination: PageInfo,
}

impl PartyListResponse {
    pub fn new(page: Page<PartyListItem>, query: &ListQuery) -> Self {
        Self {
            pagination: PageInfo::new(query.page, query.page_size, page.total),
            parties: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SoftDeleteResponse {
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use partyhub_core::StoreId;

    #[test]
    fn create_reports_all_missing_fields_at_once() {
        let req = CreatePartyRequest {
            name: Some("  ".to_string()),
            party_type: Some("customer".to_string()),
            ..Default::default()
        };
        let res = req.into_command().unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn create_builds_a_trimmed_command() {
        let store_id = StoreId::new();
        let req: CreatePartyRequest = serde_json::from_value(serde_json::json!({
            "storeId": store_id.to_string(),
            "name": " Asha Traders ",
            "phoneNumber": "9876500000 ",
            "type": "supplier",
            "gstType": "REGISTERED",
            "balance": -20.5,
        }))
        .unwrap();

        let cmd = req.into_command().unwrap();
        assert_eq!(cmd.party_type, PartyType::Supplier);
        assert_eq!(cmd.store_id, store_id);
        assert_eq!(cmd.name, "Asha Traders");
        assert_eq!(cmd.phone_number, "9876500000");
        assert_eq!(cmd.balance, Some(-20.5));
        assert!(cmd.address.is_none());
    }

    #[test]
    fn update_ignores_blank_gst_type() {
        let req = UpdatePartyRequest {
            party_id: Some(partyhub_core::PartyId::new().to_string()),
            party_type: Some("customer".to_string()),
            gst_type: Some(String::new()),
            email: Some("a@b.in".to_string()),
            ..Default::default()
        };
        let update = req.into_update().unwrap();
        assert_eq!(update.patch.gst_type, None);
        assert_eq!(update.patch.email.as_deref(), Some("a@b.in"));
    }

    #[test]
    fn delete_requires_a_non_empty_id_list() {
        let req = DeletePartiesRequest {
            store_id: Some(StoreId::new().to_string()),
            party_type: Some("supplier".to_string()),
            party_ids: Some(Vec::new()),
        };
        assert_eq!(req.into_command().unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pagination_envelope_matches_query() {
        let query = ListQuery {
            page: 2,
            page_size: 10,
            ..ListQuery::default()
        };
        let page = Page {
            items: Vec::new(),
            total: 25,
        };
        let body = serde_json::to_value(PartyListResponse::new(page, &query)).unwrap();
        assert_eq!(body["pagination"]["totalPages"], 3);
        assert_eq!(body["pagination"]["nextPage"], 3);
        assert_eq!(body["pagination"]["previousPage"], 1);
        assert_eq!(body["parties"], serde_json::json!([]));
    }
}
