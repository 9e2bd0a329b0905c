//! Raw `users` rows to canonical [`User`] values.
//!
//! Rows reach the client in snake_case from the table API, but older
//! sign-up metadata and some joins spell names in camelCase. Both spellings
//! are read; snake_case wins when both carry a value.

use serde::{Deserialize, Serialize};

use super::{Role, User, UserId, UserParts, VendorSummary};

/// Raw `users` table row as returned by the hosted table API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUserRecord {
    /// Provider-issued identifier.
    pub id: Option<UserId>,
    /// Sign-in email.
    #[serde(default)]
    pub email: Option<String>,
    /// Given name (snake_case column).
    #[serde(default)]
    pub first_name: Option<String>,
    /// Given name (camelCase spelling).
    #[serde(default, rename = "firstName")]
    pub first_name_camel: Option<String>,
    /// Family name (snake_case column).
    #[serde(default)]
    pub last_name: Option<String>,
    /// Family name (camelCase spelling).
    #[serde(default, rename = "lastName")]
    pub last_name_camel: Option<String>,
    /// Raw role column.
    #[serde(default)]
    pub role: Option<String>,
    /// Account status column.
    #[serde(default)]
    pub status: Option<String>,
    /// Avatar URL.
    #[serde(default, alias = "avatar_url")]
    pub avatar: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Joined vendor row(s).
    #[serde(default, alias = "vendor", skip_serializing_if = "Option::is_none")]
    pub vendors: Option<VendorJoin>,
}

/// Vendor join as the table API returns it: one object or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VendorJoin {
    /// One-to-one join.
    One(RawVendorRecord),
    /// One-to-many join; the first row is used.
    Many(Vec<RawVendorRecord>),
}

impl VendorJoin {
    fn first(&self) -> Option<&RawVendorRecord> {
        match self {
            Self::One(record) => Some(record),
            Self::Many(records) => records.first(),
        }
    }
}

/// Raw `vendors` table row.
///
/// `shopname` is the column name; `shop_name` is accepted on input only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVendorRecord {
    /// Vendor row identifier.
    pub id: String,
    /// Shop name.
    #[serde(default, alias = "shop_name")]
    pub shopname: Option<String>,
    /// Approval status.
    #[serde(default)]
    pub status: Option<String>,
}

/// Map a raw row into the canonical user shape.
///
/// Returns `None` only when the row lacks an identifier or email; everything
/// else is optional and stays absent rather than defaulted.
///
/// # Examples
/// ```
/// use marketplace_client::domain::{map_profile, RawUserRecord, Role, UserId};
///
/// let raw = RawUserRecord {
///     id: Some(UserId::new("u1").unwrap()),
///     email: Some("a@b.com".to_owned()),
///     first_name: Some("Ana".to_owned()),
///     last_name: Some("Lee".to_owned()),
///     role: Some("VENDOR".to_owned()),
///     status: Some("ACTIVE".to_owned()),
///     ..RawUserRecord::default()
/// };
/// let user = map_profile(&raw).unwrap();
/// assert_eq!(user.name(), "Ana Lee");
/// assert_eq!(user.role(), Some(Role::Vendor));
/// ```
#[must_use]
pub fn map_profile(raw: &RawUserRecord) -> Option<User> {
    let id = raw.id.clone()?;
    let email = present(raw.email.as_deref())?;

    let user = User::new(UserParts {
        id,
        email,
        first_name: dual_read(raw.first_name.as_deref(), raw.first_name_camel.as_deref()),
        last_name: dual_read(raw.last_name.as_deref(), raw.last_name_camel.as_deref()),
        role: Role::from_raw(raw.role.as_deref()),
        status: present(raw.status.as_deref()),
    })
    .with_avatar(present(raw.avatar.as_deref()))
    .with_phone(present(raw.phone.as_deref()))
    .with_vendor(
        raw.vendors
            .as_ref()
            .and_then(VendorJoin::first)
            .map(map_vendor),
    );
    Some(user)
}

fn map_vendor(raw: &RawVendorRecord) -> VendorSummary {
    VendorSummary {
        id: raw.id.clone(),
        shopname: present(raw.shopname.as_deref()),
        status: present(raw.status.as_deref()),
    }
}

fn dual_read(snake: Option<&str>, camel: Option<&str>) -> Option<String> {
    present(snake).or_else(|| present(camel))
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn decode(value: serde_json::Value) -> RawUserRecord {
        serde_json::from_value(value).expect("raw record should decode")
    }

    #[fixture]
    fn vendor_row() -> serde_json::Value {
        json!({
            "id": "u1",
            "email": "a@b.com",
            "first_name": "Ana",
            "last_name": "Lee",
            "role": "VENDOR",
            "status": "ACTIVE"
        })
    }

    #[rstest]
    fn maps_documented_vendor_example(vendor_row: serde_json::Value) {
        let user = map_profile(&decode(vendor_row)).expect("mapped user");
        let value = serde_json::to_value(&user).expect("serialise user");
        assert_eq!(
            value,
            json!({
                "id": "u1",
                "email": "a@b.com",
                "firstName": "Ana",
                "lastName": "Lee",
                "role": "VENDOR",
                "status": "ACTIVE",
                "name": "Ana Lee"
            })
        );
    }

    #[rstest]
    fn snake_and_camel_name_fields_map_identically() {
        let snake = decode(json!({
            "id": "u1", "email": "a@b.com",
            "first_name": "Ana", "last_name": "Lee", "role": "CUSTOMER"
        }));
        let camel = decode(json!({
            "id": "u1", "email": "a@b.com",
            "firstName": "Ana", "lastName": "Lee", "role": "CUSTOMER"
        }));
        assert_eq!(map_profile(&snake), map_profile(&camel));
    }

    #[rstest]
    fn snake_case_wins_when_both_spellings_present() {
        let raw = decode(json!({
            "id": "u1", "email": "a@b.com",
            "first_name": "Ana", "firstName": "Anna",
            "last_name": "", "lastName": "Lee"
        }));
        let user = map_profile(&raw).expect("mapped user");
        assert_eq!(user.first_name(), Some("Ana"));
        assert_eq!(user.last_name(), Some("Lee"));
        assert_eq!(user.name(), "Ana Lee");
    }

    #[rstest]
    fn absent_optionals_stay_absent() {
        let user = map_profile(&decode(json!({ "id": "u9", "email": "z@y.com" })))
            .expect("mapped user");
        assert!(user.first_name().is_none());
        assert!(user.role().is_none());
        assert!(user.status().is_none());
        assert!(user.avatar().is_none());
        assert!(user.phone().is_none());
        assert!(user.vendor().is_none());
        assert_eq!(user.name(), "");
    }

    #[rstest]
    #[case(json!({ "id": "v1", "shopname": "Lee Co", "status": "APPROVED" }))]
    #[case(json!([{ "id": "v1", "shop_name": "Lee Co", "status": "APPROVED" }]))]
    fn vendor_join_maps_to_shopname(#[case] join: serde_json::Value) {
        let mut row = vendor_row();
        row["vendors"] = join;
        let user = map_profile(&decode(row)).expect("mapped user");
        assert_eq!(
            user.vendor(),
            Some(&VendorSummary {
                id: "v1".to_owned(),
                shopname: Some("Lee Co".to_owned()),
                status: Some("APPROVED".to_owned()),
            })
        );
    }

    #[rstest]
    fn vendor_join_without_shopname_keeps_it_absent() {
        let raw = decode(json!({ "id": "u1", "email": "a@b.com", "vendors": { "id": "v1" } }));
        let user = map_profile(&raw).expect("mapped user");
        let vendor = user.vendor().expect("vendor joined");
        assert_eq!(vendor.id, "v1");
        assert!(vendor.shopname.is_none());

        let value = serde_json::to_value(&user).expect("serialise user");
        assert_eq!(value["vendor"], json!({ "id": "v1" }));
    }

    #[rstest]
    fn empty_vendor_list_maps_to_no_vendor() {
        let mut row = vendor_row();
        row["vendors"] = json!([]);
        let user = map_profile(&decode(row)).expect("mapped user");
        assert!(user.vendor().is_none());
    }

    #[rstest]
    fn avatar_url_alias_is_read() {
        let raw = decode(json!({
            "id": "u1", "email": "a@b.com", "avatar_url": "https://cdn/a.png"
        }));
        let user = map_profile(&raw).expect("mapped user");
        assert_eq!(user.avatar(), Some("https://cdn/a.png"));
    }

    #[rstest]
    fn rows_without_identity_do_not_map() {
        assert!(map_profile(&decode(json!({ "email": "a@b.com" }))).is_none());
        assert!(map_profile(&decode(json!({ "id": "u1" }))).is_none());
    }
}
