/// Source column headers recognised by the record builder.
/// Each slice lists accepted spellings in priority order; every entry is run
/// through the active header normalization before lookup.

// Identity and classification
pub const ENTITY_TYPE: &[&str] = &["entityType", "type"];
pub const CLIENT_ID: &[&str] = &["clientId", "profileId"];
pub const STATUS: &[&str] = &["status"];
pub const ACTION: &[&str] = &["action"];
pub const ACTIVE_STATUS: &[&str] = &["activeStatus"];

// Names
pub const COMPANY_NAME: &[&str] = &["companyName", "name"];
pub const NAME: &[&str] = &["name"];
pub const FORENAME: &[&str] = &["forename"];
pub const MIDDLENAME: &[&str] = &["middlename"];
pub const SURNAME: &[&str] = &["surname"];
pub const TITLES: &[&str] = &["titles", "title"];
pub const SUFFIXES: &[&str] = &["suffixes", "suffix"];

// Person-only
pub const GENDER: &[&str] = &["gender"];
pub const DATE_OF_BIRTH: &[&str] = &["dateOfBirth"];
pub const BIRTH_PLACE_COUNTRY_CODE: &[&str] = &["birthPlaceCountryCode"];
pub const DECEASED_ON: &[&str] = &["deceasedOn"];
pub const OCCUPATION: &[&str] = &["occupation"];
pub const DOMICILE_CODES: &[&str] = &["domicileCodes"];
pub const NATIONALITY_CODES: &[&str] = &["nationalityCodes"];

// Organisation-only
pub const INCORPORATION_COUNTRY_CODE: &[&str] = &["incorporationCountryCode"];
pub const DATE_OF_INCORPORATION: &[&str] = &["dateOfIncorporation"];

// Review and assessment
pub const ASSESSMENT_REQUIRED: &[&str] = &["assessmentRequired"];
pub const LAST_REVIEWED: &[&str] = &["lastReviewed"];
pub const PERIODIC_REVIEW_START_DATE: &[&str] = &["periodicReviewStartDate"];
pub const PERIODIC_REVIEW_PERIOD: &[&str] = &["periodicReviewPeriod"];

// Profile extras carried over from the legacy sheet layout
pub const PROFILE_NOTES: &[&str] = &["profileNotes"];
pub const LAST_MODIFIED_DATE: &[&str] = &["lastModifiedDate"];

/// List-valued columns, emitted under the same key
pub const CODE_LIST_FIELDS: &[&str] = &[
    "countryOfRegistrationCode",
    "countryOfAffiliationCode",
    "formerlySanctionedRegionCode",
    "sanctionedRegionCode",
    "enhancedRiskCountryCode",
    "dateOfRegistrationArray",
    "dateOfBirthArray",
    "residentOfCode",
    "citizenshipCode",
    "sources",
    "companyUrls",
];

/// Members of `CODE_LIST_FIELDS` whose items are dates
pub const DATE_LIST_FIELDS: &[&str] = &["dateOfRegistrationArray", "dateOfBirthArray"];

// Identity numbers: (accepted headers, output type)
pub const TAX_NO: (&[&str], &str) = (&["National Tax No.", "taxNo"], "tax_no");
pub const ORGANISATION_IDENTIFIERS: &[(&[&str], &str)] = &[
    (&["Duns Number", "duns"], "duns"),
    (&["Legal Entity Identifier (LEI)", "lei"], "lei"),
];
pub const PERSON_IDENTIFIERS: &[(&[&str], &str)] = &[
    (&["National ID", "nationalId"], "national_id"),
    (&["Driving Licence No.", "drivingLicenceNo"], "driving_licence"),
    (&["Social Security No.", "ssn"], "ssn"),
    (&["Passport No.", "passportNo"], "passport_no"),
];

// Address
pub const ADDRESS_LINE: &[&str] = &["Address Line", "line"];
pub const ADDRESS_LINE_1: &[&str] = &["Address Line 1", "line1"];
pub const ADDRESS_LINE_2: &[&str] = &["Address Line 2", "line2"];
pub const ADDRESS_LINE_3: &[&str] = &["Address Line 3", "line3"];
pub const ADDRESS_LINE_4: &[&str] = &["Address Line 4", "line4"];
pub const PO_BOX: &[&str] = &["poBox"];
pub const CITY: &[&str] = &["city"];
pub const PROVINCE: &[&str] = &["province", "state"];
pub const POST_CODE: &[&str] = &["postCode", "postcode"];
pub const COUNTRY: &[&str] = &["country"];
pub const COUNTRY_CODE: &[&str] = &["countryCode"];

/// Normalized-key prefixes of alias columns (`aliases1`, `alias2`, ...)
pub const ALIAS_PREFIXES: &[&str] = &["aliases", "alias"];
pub const ALIAS_LITERAL_TYPE: &str = "Also Known As";
pub const ALIAS_INDEXED_PREFIX: &str = "AKA";

// List memberships
pub const LIST_SLOTS: usize = 4;

pub fn list_header(index: usize) -> String {
    format!("List {index}")
}

pub fn active_list_header(index: usize) -> String {
    format!("Active List {index}")
}

pub fn since_list_header(index: usize) -> String {
    format!("Since List {index}")
}

pub fn to_list_header(index: usize) -> String {
    format!("To List {index}")
}

// Security tags
pub const SECURITY_ENABLED: &[&str] = &["securityEnabled"];
pub const SECURITY_TAGS: &[(&[&str], &str)] = &[
    (&["orTags1"], "orTags1"),
    (&["orTags2"], "orTags2"),
    (&["orTags3"], "orTags3"),
];

/// Default `objectType` marker
pub const DEFAULT_OBJECT_TYPE: &str = "client";
