//! In-memory Keycloak tables for end-to-end tests.

use rusqlite::{params, Connection};

pub const REALM: &str = "realm-1";
pub const OTHER_REALM: &str = "realm-2";

const SCHEMA: &str = r#"
CREATE TABLE USER_ENTITY (
    ID TEXT PRIMARY KEY,
    USERNAME TEXT,
    ENABLED INTEGER,
    CREATED_TIMESTAMP INTEGER,
    REALM_ID TEXT NOT NULL,
    SERVICE_ACCOUNT_CLIENT_LINK TEXT
);
CREATE TABLE USER_SCIM_ATTRIBUTES (
    ID TEXT PRIMARY KEY,
    USER_ID TEXT NOT NULL,
    EXTERNAL_ID TEXT,
    NAME_FORMATTED TEXT,
    FAMILY_NAME TEXT,
    GIVEN_NAME TEXT,
    MIDDLE_NAME TEXT,
    NAME_HONORIFIC_PREFIX TEXT,
    NAME_HONORIFIC_SUFFIX TEXT,
    DISPLAY_NAME TEXT,
    NICK_NAME TEXT,
    PROFILE_URL TEXT,
    TITLE TEXT,
    USER_TYPE TEXT,
    PREFERRED_LANGUAGE TEXT,
    LOCALE TEXT,
    TIMEZONE TEXT,
    LAST_MODIFIED INTEGER,
    EP_EMPLOYEE_NUMBER TEXT,
    EP_COST_CENTER TEXT,
    EP_ORGANIZATION TEXT,
    EP_DIVISION TEXT,
    EP_DEPARTMENT TEXT,
    EP_MANAGER_VALUE TEXT,
    EP_MANAGER_REFERENCE TEXT
);
CREATE TABLE SCIM_ADDRESSES (
    ID TEXT PRIMARY KEY,
    SCIM_ATTRIBUTES_ID TEXT NOT NULL,
    FORMATTED TEXT,
    STREET_ADDRESS TEXT,
    LOCALITY TEXT,
    REGION TEXT,
    POSTALCODE TEXT,
    COUNTRY TEXT,
    ADDRESS_TYPE TEXT,
    IS_PRIMARY INTEGER
);
CREATE TABLE SCIM_CERTIFICATES (
    ID TEXT PRIMARY KEY,
    SCIM_ATTRIBUTES_ID TEXT NOT NULL,
    CERTIFICATE_VALUE TEXT,
    CERTIFICATE_TYPE TEXT,
    CERTIFICATE_DISPLAY TEXT,
    IS_PRIMARY INTEGER
);
CREATE TABLE SCIM_EMAILS (
    ID TEXT PRIMARY KEY,
    SCIM_ATTRIBUTES_ID TEXT NOT NULL,
    EMAIL_VALUE TEXT,
    EMAIL_TYPE TEXT,
    IS_PRIMARY INTEGER
);
CREATE TABLE SCIM_ENTITLEMENTS (
    ID TEXT PRIMARY KEY,
    SCIM_ATTRIBUTES_ID TEXT NOT NULL,
    ENTITLEMENT_VALUE TEXT,
    ENTITLEMENT_TYPE TEXT,
    ENTITLEMENT_DISPLAY TEXT,
    IS_PRIMARY INTEGER
);
CREATE TABLE SCIM_PHONE_NUMBERS (
    ID TEXT PRIMARY KEY,
    SCIM_ATTRIBUTES_ID TEXT NOT NULL,
    PHONE_VALUE TEXT,
    PHONE_TYPE TEXT,
    PHONE_DISPLAY TEXT,
    IS_PRIMARY INTEGER
);
CREATE TABLE SCIM_PHOTOS (
    ID TEXT PRIMARY KEY,
    SCIM_ATTRIBUTES_ID TEXT NOT NULL,
    PHOTO_VALUE TEXT,
    PHOTO_TYPE TEXT,
    PHOTO_DISPLAY TEXT,
    IS_PRIMARY INTEGER
);
CREATE TABLE SCIM_IMS (
    ID TEXT PRIMARY KEY,
    SCIM_ATTRIBUTES_ID TEXT NOT NULL,
    IMS_VALUE TEXT,
    IMS_TYPE TEXT,
    IMS_DISPLAY TEXT,
    IS_PRIMARY INTEGER
);
CREATE TABLE SCIM_PERSON_ROLES (
    ID TEXT PRIMARY KEY,
    SCIM_ATTRIBUTES_ID TEXT NOT NULL,
    PERSON_ROLE_VALUE TEXT,
    PERSON_ROLE_TYPE TEXT,
    PERSON_ROLE_DISPLAY TEXT,
    IS_PRIMARY INTEGER
);
CREATE TABLE KEYCLOAK_GROUP (
    ID TEXT PRIMARY KEY,
    NAME TEXT,
    REALM_ID TEXT NOT NULL
);
CREATE TABLE USER_GROUP_MEMBERSHIP (
    GROUP_ID TEXT NOT NULL,
    USER_ID TEXT NOT NULL,
    PRIMARY KEY (GROUP_ID, USER_ID)
);
CREATE TABLE KEYCLOAK_ROLE (
    ID TEXT PRIMARY KEY,
    NAME TEXT,
    DESCRIPTION TEXT,
    REALM_ID TEXT NOT NULL,
    CLIENT_ROLE INTEGER NOT NULL
);
"#;

pub fn empty_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
}

pub fn add_user(conn: &Connection, id: &str, username: &str, family_name: Option<&str>) {
    add_user_in(conn, REALM, id, username, family_name);
}

pub fn add_user_in(
    conn: &Connection,
    realm: &str,
    id: &str,
    username: &str,
    family_name: Option<&str>,
) {
    conn.execute(
        "INSERT INTO USER_ENTITY (ID, USERNAME, ENABLED, CREATED_TIMESTAMP, REALM_ID) \
         VALUES (?1, ?2, 1, 1305261754000, ?3)",
        params![id, username, realm],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO USER_SCIM_ATTRIBUTES (ID, USER_ID, FAMILY_NAME) VALUES (?1, ?2, ?3)",
        params![format!("sa-{}", id), id, family_name],
    )
    .unwrap();
}

pub fn add_email(conn: &Connection, user_id: &str, value: &str, kind: &str, primary: bool) {
    conn.execute(
        "INSERT INTO SCIM_EMAILS (ID, SCIM_ATTRIBUTES_ID, EMAIL_VALUE, EMAIL_TYPE, IS_PRIMARY) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            format!("em-{}-{}", user_id, value),
            format!("sa-{}", user_id),
            value,
            kind,
            primary
        ],
    )
    .unwrap();
}

pub fn add_entitlement(conn: &Connection, user_id: &str, value: &str, display: &str) {
    conn.execute(
        "INSERT INTO SCIM_ENTITLEMENTS \
         (ID, SCIM_ATTRIBUTES_ID, ENTITLEMENT_VALUE, ENTITLEMENT_DISPLAY, IS_PRIMARY) \
         VALUES (?1, ?2, ?3, ?4, 0)",
        params![
            format!("en-{}-{}", user_id, value),
            format!("sa-{}", user_id),
            value,
            display
        ],
    )
    .unwrap();
}

pub fn add_group(conn: &Connection, id: &str, name: &str) {
    conn.execute(
        "INSERT INTO KEYCLOAK_GROUP (ID, NAME, REALM_ID) VALUES (?1, ?2, ?3)",
        params![id, name, REALM],
    )
    .unwrap();
}

pub fn add_member(conn: &Connection, group_id: &str, user_id: &str) {
    conn.execute(
        "INSERT INTO USER_GROUP_MEMBERSHIP (GROUP_ID, USER_ID) VALUES (?1, ?2)",
        params![group_id, user_id],
    )
    .unwrap();
}

/// Three users, one of them named "alice"; bob has two emails.
pub fn three_users() -> Connection {
    let conn = empty_db();
    add_user(&conn, "u1", "alice", Some("Anders"));
    add_user(&conn, "u2", "bob", Some("Berg"));
    add_user(&conn, "u3", "carol", None);
    add_email(&conn, "u1", "alice@example.org", "work", true);
    add_email(&conn, "u2", "bob@test.de", "work", true);
    add_email(&conn, "u2", "bob@example.org", "home", false);
    conn
}
