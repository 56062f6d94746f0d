use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::emptiness::IsEmpty;
use super::extractors::{
    is_true_literal, strip_decimal_suffix, to_boolean, to_country_code, to_epoch_millis,
    to_identifier_string, to_partial_date, to_string_list,
};
use super::headers::{HeaderMode, NormalizedRow};
use super::record::{
    Address, Alias, ClientRecord, IdentityNumber, ListMembership, ListRef, Security,
};
use super::RowTransformer;
use crate::constants::*;
use crate::types::{EntityKind, RawCell, Row};

/// How alias entries are labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasTagging {
    /// `{"type": "Also Known As"}` on every alias
    #[default]
    Literal,
    /// `{"nameType": "AKA1"}`, `AKA2`, ... by position
    Indexed,
}

impl FromStr for AliasTagging {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "literal" => Ok(AliasTagging::Literal),
            "indexed" => Ok(AliasTagging::Indexed),
            other => Err(format!("unknown alias tagging '{other}' (expected literal or indexed)")),
        }
    }
}

impl fmt::Display for AliasTagging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasTagging::Literal => write!(f, "literal"),
            AliasTagging::Indexed => write!(f, "indexed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
    pub header_mode: HeaderMode,
    pub alias_tags: AliasTagging,
    pub object_type: String,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            header_mode: HeaderMode::default(),
            alias_tags: AliasTagging::default(),
            object_type: DEFAULT_OBJECT_TYPE.to_string(),
        }
    }
}

/// Maps one spreadsheet row onto a [`ClientRecord`].
///
/// Stateless: every call normalizes its row from scratch, and a cell that
/// cannot be coerced only costs that one field.
#[derive(Debug, Clone, Default)]
pub struct ClientRecordBuilder {
    options: BuilderOptions,
}

impl ClientRecordBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    #[instrument(level = "trace", skip_all)]
    pub fn build(&self, row: &Row) -> ClientRecord {
        let row = NormalizedRow::from_row(row, self.options.header_mode);
        let mut record = ClientRecord::new(self.options.object_type.clone());

        let entity_type = text(&row, ENTITY_TYPE);
        let kind = EntityKind::classify(entity_type.as_deref());
        debug!(?kind, "building record");

        record.entity_type = entity_type;
        record.client_id = text(&row, CLIENT_ID);
        record.status = text(&row, STATUS);
        record.action = text(&row, ACTION);
        record.active_status = text(&row, ACTIVE_STATUS);

        if kind.is_organisation() {
            record.company_name = text(&row, COMPANY_NAME);
        } else {
            record.name = text(&row, NAME);
            record.forename = text(&row, FORENAME);
            record.middlename = text(&row, MIDDLENAME);
            record.surname = text(&row, SURNAME);
        }
        record.titles = list(&row, TITLES);
        record.suffixes = list(&row, SUFFIXES);

        match kind {
            EntityKind::Person => Self::fill_person(&row, &mut record),
            EntityKind::Organisation => Self::fill_organisation(&row, &mut record),
            EntityKind::Other => {}
        }

        Self::fill_review(&row, &mut record);
        Self::fill_profile_extras(&row, &mut record);

        record.identity_numbers = Self::identity_numbers(&row, kind);
        record.addresses = Self::address(&row).into_iter().collect();
        record.aliases = self.aliases(&row, kind);
        record.lists = Self::lists(&row);
        record.security = Self::security(&row);

        record
    }

    fn fill_person(row: &NormalizedRow, record: &mut ClientRecord) {
        record.gender = text(row, GENDER).map(|g| g.to_uppercase());
        record.date_of_birth = partial_date(row, DATE_OF_BIRTH);
        record.birth_place_country_code = text(row, BIRTH_PLACE_COUNTRY_CODE);
        record.deceased_on = partial_date(row, DECEASED_ON);
        record.occupation = text(row, OCCUPATION);
        record.domicile_codes = list(row, DOMICILE_CODES);
        record.nationality_codes = list(row, NATIONALITY_CODES);
    }

    fn fill_organisation(row: &NormalizedRow, record: &mut ClientRecord) {
        record.incorporation_country_code = text(row, INCORPORATION_COUNTRY_CODE);
        record.date_of_incorporation = partial_date(row, DATE_OF_INCORPORATION);
    }

    fn fill_review(row: &NormalizedRow, record: &mut ClientRecord) {
        record.assessment_required = row.first_present(ASSESSMENT_REQUIRED).map(to_boolean);
        if record.assessment_required == Some(true) {
            record.last_reviewed = row.first_present(LAST_REVIEWED).and_then(to_epoch_millis);
        }
        record.periodic_review_start_date = row
            .first_present(PERIODIC_REVIEW_START_DATE)
            .and_then(to_epoch_millis);
        record.periodic_review_period = text(row, PERIODIC_REVIEW_PERIOD);
    }

    fn fill_profile_extras(row: &NormalizedRow, record: &mut ClientRecord) {
        for field in CODE_LIST_FIELDS {
            let values = if DATE_LIST_FIELDS.contains(field) {
                date_list(row, &[*field])
            } else {
                list(row, &[*field])
            };
            if !values.is_empty_value() {
                record.code_lists.insert(
                    (*field).to_string(),
                    Value::Array(values.into_iter().map(Value::String).collect()),
                );
            }
        }
        record.profile_notes = text(row, PROFILE_NOTES);
        record.last_modified_date = partial_date(row, LAST_MODIFIED_DATE);
    }

    fn identity_numbers(row: &NormalizedRow, kind: EntityKind) -> Vec<IdentityNumber> {
        let specific: &[(&[&str], &str)] = match kind {
            EntityKind::Person => PERSON_IDENTIFIERS,
            EntityKind::Organisation => ORGANISATION_IDENTIFIERS,
            EntityKind::Other => &[],
        };

        std::iter::once(&TAX_NO)
            .chain(specific.iter())
            .filter_map(|(headers, id_type)| {
                text(row, headers).map(|value| IdentityNumber {
                    kind: (*id_type).to_string(),
                    value,
                })
            })
            .collect()
    }

    fn address(row: &NormalizedRow) -> Option<Address> {
        let address = Address {
            line: text(row, ADDRESS_LINE),
            line1: text(row, ADDRESS_LINE_1),
            line2: text(row, ADDRESS_LINE_2),
            line3: text(row, ADDRESS_LINE_3),
            line4: text(row, ADDRESS_LINE_4),
            po_box: text(row, PO_BOX),
            city: text(row, CITY),
            province: text(row, PROVINCE),
            post_code: text(row, POST_CODE).map(|p| strip_decimal_suffix(&p).to_string()),
            country: text(row, COUNTRY),
            country_code: text(row, COUNTRY_CODE).map(|c| to_country_code(&c)),
        };
        (!address.is_empty_value()).then_some(address)
    }

    fn aliases(&self, row: &NormalizedRow, kind: EntityKind) -> Vec<Alias> {
        let mut columns: Vec<(u32, &RawCell)> = row
            .iter()
            .filter_map(|(key, cell)| alias_index(key).map(|index| (index, cell)))
            .collect();
        // Stable: equal indices keep sheet order
        columns.sort_by_key(|(index, _)| *index);

        columns
            .into_iter()
            .filter_map(|(_, cell)| to_identifier_string(cell))
            .enumerate()
            .map(|(position, value)| {
                let mut alias = Alias::default();
                if kind.is_organisation() {
                    alias.company_name = Some(value);
                } else {
                    alias.name = Some(value);
                }
                match self.options.alias_tags {
                    AliasTagging::Literal => alias.alias_type = Some(ALIAS_LITERAL_TYPE.to_string()),
                    AliasTagging::Indexed => {
                        alias.name_type = Some(format!("{ALIAS_INDEXED_PREFIX}{}", position + 1))
                    }
                }
                alias
            })
            .collect()
    }

    fn lists(row: &NormalizedRow) -> Vec<ListMembership> {
        (1..=LIST_SLOTS)
            .filter_map(|i| {
                let id = row.get(&list_header(i)).and_then(to_identifier_string)?;
                let active = row.get(&active_list_header(i)).is_some_and(is_true_literal);
                Some(ListMembership {
                    id: id.clone(),
                    name: id.clone(),
                    active,
                    list_active: active,
                    hierarchy: vec![ListRef {
                        id: id.clone(),
                        name: id,
                    }],
                    since: row.get(&since_list_header(i)).and_then(to_partial_date),
                    to: row.get(&to_list_header(i)).and_then(to_partial_date),
                })
            })
            .collect()
    }

    fn security(row: &NormalizedRow) -> Option<Security> {
        if !row.first_present(SECURITY_ENABLED).is_some_and(to_boolean) {
            return None;
        }
        let mut tags = SECURITY_TAGS.iter().map(|(headers, _)| text(row, headers));
        let security = Security {
            or_tags1: tags.next().flatten(),
            or_tags2: tags.next().flatten(),
            or_tags3: tags.next().flatten(),
        };
        (!security.is_empty_value()).then_some(security)
    }
}

impl RowTransformer for ClientRecordBuilder {
    fn transform(&self, row: &Row) -> ClientRecord {
        self.build(row)
    }

    fn name(&self) -> &str {
        "client_record_builder"
    }
}

fn text(row: &NormalizedRow, headers: &[&str]) -> Option<String> {
    row.first_present(headers).and_then(to_identifier_string)
}

fn list(row: &NormalizedRow, headers: &[&str]) -> Vec<String> {
    row.first_present(headers).map(to_string_list).unwrap_or_default()
}

/// Split like `list`, then normalize each item as a partial date
fn date_list(row: &NormalizedRow, headers: &[&str]) -> Vec<String> {
    match row.first_present(headers) {
        Some(cell @ (RawCell::Date(_) | RawCell::Number(_))) => {
            to_partial_date(cell).into_iter().collect()
        }
        Some(cell) => to_string_list(cell)
            .into_iter()
            .filter_map(|item| to_partial_date(&RawCell::Text(item)))
            .collect(),
        None => Vec::new(),
    }
}

fn partial_date(row: &NormalizedRow, headers: &[&str]) -> Option<String> {
    row.first_present(headers).and_then(to_partial_date)
}

/// `aliases3` -> 3, `alias12` -> 12; anything else is not an alias column
fn alias_index(key: &str) -> Option<u32> {
    ALIAS_PREFIXES.iter().find_map(|prefix| {
        let digits = key.strip_prefix(prefix)?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: serde_json::Value) -> serde_json::Value {
        build_with(value, BuilderOptions::default())
    }

    fn build_with(value: serde_json::Value, options: BuilderOptions) -> serde_json::Value {
        let row = Row::from_json(&value).unwrap();
        ClientRecordBuilder::new(options).build(&row).to_json().unwrap()
    }

    #[test]
    fn test_person_scenario() {
        let record = build(json!({
            "type": "PERSON",
            "profileId": "123",
            "name": "John Smith",
            "National ID": "X123",
            "city": "Lagos",
            "countryCode": "ng"
        }));

        assert_eq!(
            record,
            json!({
                "objectType": "client",
                "entityType": "PERSON",
                "clientId": "123",
                "name": "John Smith",
                "identityNumbers": [{"type": "national_id", "value": "X123"}],
                "addresses": [{"city": "Lagos", "countryCode": "NG"}]
            })
        );
        assert!(record.get("companyName").is_none());
    }

    #[test]
    fn test_organisation_scenario() {
        let record = build(json!({
            "entityType": "ORGANISATION",
            "name": "Acme Corp",
            "Duns Number": 123456
        }));

        assert_eq!(record["companyName"], json!("Acme Corp"));
        assert_eq!(record["identityNumbers"], json!([{"type": "duns", "value": "123456"}]));
        assert!(record.get("name").is_none());
        assert!(record.get("forename").is_none());
    }

    #[test]
    fn test_list_scenario() {
        let record = build(json!({
            "List 1": "Sanctions",
            "Active List 1": "true",
            "Since List 1": "2020"
        }));

        assert_eq!(
            record["lists"],
            json!([{
                "id": "Sanctions",
                "name": "Sanctions",
                "active": true,
                "listActive": true,
                "hierarchy": [{"id": "Sanctions", "name": "Sanctions"}],
                "since": "2020"
            }])
        );
    }

    #[test]
    fn test_all_empty_address_is_omitted() {
        let record = build(json!({
            "type": "PERSON",
            "name": "Jane",
            "Address Line": null,
            "city": "  ",
            "province": "nan",
            "postCode": null,
            "countryCode": ""
        }));

        assert!(record.get("addresses").is_none());
    }

    #[test]
    fn test_person_excludes_organisation_fields() {
        let record = build(json!({
            "entityType": "PERSON",
            "name": "Ada",
            "companyName": "Ignored Ltd",
            "incorporationCountryCode": "GB",
            "dateOfIncorporation": "1990",
            "gender": "female",
            "dateOfBirth": "1815-12"
        }));

        assert!(record.get("companyName").is_none());
        assert!(record.get("incorporationCountryCode").is_none());
        assert!(record.get("dateOfIncorporation").is_none());
        assert_eq!(record["gender"], json!("FEMALE"));
        assert_eq!(record["dateOfBirth"], json!("1815-12"));
    }

    #[test]
    fn test_organisation_excludes_person_fields() {
        let record = build(json!({
            "entityType": "company",
            "companyName": "Acme Corp",
            "gender": "M",
            "dateOfBirth": "1970-01-01",
            "nationalityCodes": "GB",
            "incorporationCountryCode": "DE",
            "dateOfIncorporation": "2001-02-03T00:00:00Z"
        }));

        assert!(record.get("gender").is_none());
        assert!(record.get("dateOfBirth").is_none());
        assert!(record.get("nationalityCodes").is_none());
        assert_eq!(record["incorporationCountryCode"], json!("DE"));
        assert_eq!(record["dateOfIncorporation"], json!("2001-02-03"));
    }

    #[test]
    fn test_unknown_entity_type_keeps_common_fields() {
        let record = build(json!({
            "type": "VESSEL",
            "clientId": 99.0,
            "status": "ACTIVE",
            "name": "Sea Breeze",
            "National Tax No.": "T-1",
            "National ID": "ignored",
            "gender": "ignored"
        }));

        assert_eq!(
            record,
            json!({
                "objectType": "client",
                "entityType": "VESSEL",
                "clientId": "99",
                "status": "ACTIVE",
                "name": "Sea Breeze",
                "identityNumbers": [{"type": "tax_no", "value": "T-1"}]
            })
        );
    }

    #[test]
    fn test_missing_entity_type_does_not_abort() {
        let record = build(json!({"forename": "Ada", "surname": "Lovelace"}));
        assert_eq!(
            record,
            json!({"objectType": "client", "forename": "Ada", "surname": "Lovelace"})
        );
    }

    #[test]
    fn test_identity_numbers_follow_fixed_order() {
        let person = build(json!({
            "type": "PERSON",
            "Passport No.\t": "P-4",
            "Social Security No.": "S-3",
            "Driving Licence No.\t": "D-2",
            "National ID": "N-1",
            "National Tax No.": "T-0"
        }));
        let kinds: Vec<&str> = person["identityNumbers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|id| id["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["tax_no", "national_id", "driving_licence", "ssn", "passport_no"]);

        let company = build(json!({
            "type": "COMPANY",
            "Legal Entity Identifier (LEI)": "529900T8BM49AURSDO55",
            "Duns Number": 150483782.0,
            "National Tax No.": "GB123"
        }));
        assert_eq!(
            company["identityNumbers"],
            json!([
                {"type": "tax_no", "value": "GB123"},
                {"type": "duns", "value": "150483782"},
                {"type": "lei", "value": "529900T8BM49AURSDO55"}
            ])
        );
    }

    #[test]
    fn test_address_cleanup() {
        let record = build(json!({
            "Address Line": "1 Marina",
            "Address Line 2": "Floor 3",
            "state": "Lagos State",
            "postcode": 100001.0,
            "country": "Nigeria",
            "countryCode": "nga"
        }));

        assert_eq!(
            record["addresses"],
            json!([{
                "line": "1 Marina",
                "line2": "Floor 3",
                "province": "Lagos State",
                "postCode": "100001",
                "country": "Nigeria",
                "countryCode": "NG"
            }])
        );
    }

    #[test]
    fn test_country_code_stays_two_characters() {
        let record = build(json!({"countryCode": "ßa"}));
        assert_eq!(record["addresses"], json!([{"countryCode": "SS"}]));
    }

    #[test]
    fn test_textual_postcode_loses_decimal_suffix() {
        let record = build(json!({"postCode": "2000.0"}));
        assert_eq!(record["addresses"], json!([{"postCode": "2000"}]));
    }

    #[test]
    fn test_aliases_literal_policy() {
        let record = build(json!({
            "type": "PERSON",
            "aliases2": "Johnny",
            "aliases1": "J. Smith",
            "aliases3": null,
            "aliasesNote": "not an alias column"
        }));

        assert_eq!(
            record["aliases"],
            json!([
                {"name": "J. Smith", "type": "Also Known As"},
                {"name": "Johnny", "type": "Also Known As"}
            ])
        );
    }

    #[test]
    fn test_aliases_indexed_policy_for_organisations() {
        let options = BuilderOptions {
            alias_tags: AliasTagging::Indexed,
            ..BuilderOptions::default()
        };
        let record = build_with(
            json!({
                "type": "ORGANISATION",
                "name": "Acme Corp",
                "Alias 1": null,
                "Alias 2": "Acme",
                "Alias 3": "ACME Holdings"
            }),
            options,
        );

        assert_eq!(
            record["aliases"],
            json!([
                {"companyName": "Acme", "nameType": "AKA1"},
                {"companyName": "ACME Holdings", "nameType": "AKA2"}
            ])
        );
    }

    #[test]
    fn test_lists_skip_empty_slots_and_parse_dates() {
        let record = build(json!({
            "List 1": null,
            "List 2": "PEP",
            "Active List 2": "yes",
            "Since List 2": "03/15/2019",
            "To List 2": "2021-06",
            "List 4": "Adverse Media",
            "Active List 4": true
        }));

        assert_eq!(
            record["lists"],
            json!([
                {
                    "id": "PEP",
                    "name": "PEP",
                    "active": false,
                    "listActive": false,
                    "hierarchy": [{"id": "PEP", "name": "PEP"}],
                    "since": "2019-03-15",
                    "to": "2021-06"
                },
                {
                    "id": "Adverse Media",
                    "name": "Adverse Media",
                    "active": true,
                    "listActive": true,
                    "hierarchy": [{"id": "Adverse Media", "name": "Adverse Media"}]
                }
            ])
        );
    }

    #[test]
    fn test_security_requires_enabled_flag() {
        let disabled = build(json!({"securityEnabled": "no", "orTags1": "EU"}));
        assert!(disabled.get("security").is_none());

        let enabled = build(json!({"securityEnabled": "Y", "orTags1": "EU", "orTags3": "APAC"}));
        assert_eq!(enabled["security"], json!({"orTags1": "EU", "orTags3": "APAC"}));

        let no_tags = build(json!({"securityEnabled": true}));
        assert!(no_tags.get("security").is_none());
    }

    #[test]
    fn test_review_fields() {
        let record = build(json!({
            "assessmentRequired": "yes",
            "lastReviewed": "2020-01-01",
            "periodicReviewStartDate": 1_600_000_000,
            "periodicReviewPeriod": "12M"
        }));
        assert_eq!(record["assessmentRequired"], json!(true));
        assert_eq!(record["lastReviewed"], json!(1_577_836_800_000i64));
        assert_eq!(record["periodicReviewStartDate"], json!(1_600_000_000_000i64));
        assert_eq!(record["periodicReviewPeriod"], json!("12M"));

        let not_required = build(json!({
            "assessmentRequired": "false",
            "lastReviewed": "2020-01-01"
        }));
        assert_eq!(not_required["assessmentRequired"], json!(false));
        assert!(not_required.get("lastReviewed").is_none());
    }

    #[test]
    fn test_titles_suffixes_and_code_lists() {
        let record = build(json!({
            "type": "PERSON",
            "title": "Dr, Prof",
            "suffix": "Jr",
            "domicileCodes": "GB;FR",
            "sanctionedRegionCode": "IR, KP",
            "companyUrls": ""
        }));

        assert_eq!(record["titles"], json!(["Dr", "Prof"]));
        assert_eq!(record["suffixes"], json!(["Jr"]));
        assert_eq!(record["domicileCodes"], json!(["GB", "FR"]));
        assert_eq!(record["sanctionedRegionCode"], json!(["IR", "KP"]));
        assert!(record.get("companyUrls").is_none());
    }

    #[test]
    fn test_date_list_fields() {
        let record = build(json!({
            "type": "PERSON",
            "dateOfBirthArray": "1970-01-01, 5/17/1980",
            "dateOfRegistrationArray": "2019; 2021-06",
            "residentOfCode": "GB"
        }));

        assert_eq!(record["dateOfBirthArray"], json!(["1970-01-01", "1980-05-17"]));
        assert_eq!(record["dateOfRegistrationArray"], json!(["2019", "2021-06"]));

        let keys: Vec<&String> = record.as_object().unwrap().keys().collect();
        let position = |key: &str| keys.iter().position(|k| *k == key).unwrap();
        assert!(position("dateOfRegistrationArray") < position("dateOfBirthArray"));
        assert!(position("dateOfBirthArray") < position("residentOfCode"));
    }

    #[test]
    fn test_date_list_from_single_date_cell() {
        let row = Row::new().with(
            "dateOfBirthArray",
            chrono::NaiveDate::from_ymd_opt(1985, 3, 9)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        let record = ClientRecordBuilder::default().build(&row).to_json().unwrap();
        assert_eq!(record["dateOfBirthArray"], json!(["1985-03-09"]));
    }

    #[test]
    fn test_loose_mode_requires_exact_spelling() {
        let options = BuilderOptions {
            header_mode: HeaderMode::Loose,
            ..BuilderOptions::default()
        };
        let record = build_with(
            json!({
                "type": "PERSON",
                "\"Passport No.\"\t": "P-1",
                "PASSPORT NO": "ignored in loose mode"
            }),
            options,
        );

        assert_eq!(record["identityNumbers"], json!([{"type": "passport_no", "value": "P-1"}]));
    }

    #[test]
    fn test_alias_index_parsing() {
        assert_eq!(alias_index("aliases1"), Some(1));
        assert_eq!(alias_index("alias12"), Some(12));
        assert_eq!(alias_index("aliases"), None);
        assert_eq!(alias_index("aliasesx"), None);
        assert_eq!(alias_index("name"), None);
    }

    #[test]
    fn test_alias_tagging_parsing() {
        assert_eq!("Indexed".parse::<AliasTagging>(), Ok(AliasTagging::Indexed));
        assert!("aka".parse::<AliasTagging>().is_err());
    }
}
