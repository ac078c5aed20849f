//! Row types written by the import pipeline.
//!
//! Every text column is `Option<String>`: `None` means the card did not
//! carry the property and is stored as SQL `NULL`.

use crate::store::{FieldValue, Table};

/// One person.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    /// Display name (`FN`).
    pub formatted_name: Option<String>,
    /// Structured name, components joined by a space.
    pub n: Option<String>,
    pub nickname: Option<String>,
    pub photo: Option<Vec<u8>>,
    pub bday: Option<String>,
    pub anniversary: Option<String>,
    pub gender: Option<String>,
    /// Flattened to a single line.
    pub adr: Option<String>,
    pub tel: Option<String>,
    pub email: Option<String>,
    pub impp: Option<String>,
    pub lang: Option<String>,
    pub tz: Option<String>,
    pub geo: Option<String>,
    pub note: Option<String>,
}

/// An organizational affiliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub title: Option<String>,
    pub logo: Option<Vec<u8>>,
    pub org: Option<String>,
    pub related: Option<String>,
    pub url: Option<String>,
}

/// A contact's function inside a group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Role {
    pub role: Option<String>,
    pub member: Option<String>,
}

/// Link between one contact, one group and one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub contact_id: i64,
    pub group_id: i64,
    pub role_id: i64,
}

/// Miscellaneous card properties kept per contact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Other {
    pub categories: Option<String>,
    pub prodid: Option<String>,
    pub rev: Option<String>,
    pub sound: Option<String>,
    pub uid: Option<String>,
    pub clientpidmap: Option<String>,
    pub version: Option<String>,
    pub key: Option<String>,
    pub fburl: Option<String>,
    pub caladruri: Option<String>,
    pub caluri: Option<String>,
}

/// A row that knows its table and how to lay itself out as columns.
pub trait Record {
    const TABLE: Table;

    fn fields(&self) -> Vec<(&'static str, FieldValue)>;

    /// True when at least one column holds a non-empty value.
    fn has_content(&self) -> bool {
        self.fields().iter().any(|(_, value)| value.is_truthy())
    }
}

fn text(value: &Option<String>) -> FieldValue {
    FieldValue::Text(value.clone())
}

fn blob(value: &Option<Vec<u8>>) -> FieldValue {
    FieldValue::Blob(value.clone())
}

impl Record for Contact {
    const TABLE: Table = Table::Contact;

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("fn", text(&self.formatted_name)),
            ("n", text(&self.n)),
            ("nickname", text(&self.nickname)),
            ("photo", blob(&self.photo)),
            ("bday", text(&self.bday)),
            ("anniversary", text(&self.anniversary)),
            ("gender", text(&self.gender)),
            ("adr", text(&self.adr)),
            ("tel", text(&self.tel)),
            ("email", text(&self.email)),
            ("impp", text(&self.impp)),
            ("lang", text(&self.lang)),
            ("tz", text(&self.tz)),
            ("geo", text(&self.geo)),
            ("note", text(&self.note)),
        ]
    }
}

impl Record for Group {
    const TABLE: Table = Table::Groups;

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("title", text(&self.title)),
            ("logo", blob(&self.logo)),
            ("org", text(&self.org)),
            ("related", text(&self.related)),
            ("url", text(&self.url)),
        ]
    }
}

impl Record for Role {
    const TABLE: Table = Table::Role;

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("role", text(&self.role)), ("member", text(&self.member))]
    }
}

impl Record for Membership {
    const TABLE: Table = Table::IsIn;

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("contact_id", FieldValue::Integer(Some(self.contact_id))),
            ("group_id", FieldValue::Integer(Some(self.group_id))),
            ("role_id", FieldValue::Integer(Some(self.role_id))),
        ]
    }
}

impl Other {
    /// Columns for the `other` table, linked to `contact_id`.
    pub fn fields_for(&self, contact_id: i64) -> Vec<(&'static str, FieldValue)> {
        let mut fields = vec![("contact_id", FieldValue::Integer(Some(contact_id)))];
        fields.extend(self.fields());
        fields
    }
}

impl Record for Other {
    const TABLE: Table = Table::Other;

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("categories", text(&self.categories)),
            ("prodid", text(&self.prodid)),
            ("rev", text(&self.rev)),
            ("sound", text(&self.sound)),
            ("uid", text(&self.uid)),
            ("clientpidmap", text(&self.clientpidmap)),
            ("version", text(&self.version)),
            ("key", text(&self.key)),
            ("fburl", text(&self.fburl)),
            ("caladruri", text(&self.caladruri)),
            ("caluri", text(&self.caluri)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_group_has_no_content() {
        assert!(!Group::default().has_content());
        let with_empty_text = Group {
            title: Some(String::new()),
            logo: Some(Vec::new()),
            ..Group::default()
        };
        assert!(!with_empty_text.has_content());
    }

    #[test]
    fn any_field_gives_content() {
        let role = Role {
            member: Some("urn:uuid:1".into()),
            ..Role::default()
        };
        assert!(role.has_content());
        let group = Group {
            logo: Some(vec![1, 2, 3]),
            ..Group::default()
        };
        assert!(group.has_content());
    }

    #[test]
    fn other_fields_lead_with_contact_id() {
        let fields = Other::default().fields_for(7);
        assert_eq!(fields[0], ("contact_id", FieldValue::Integer(Some(7))));
        assert_eq!(fields.len(), 12);
    }

    #[test]
    fn contact_columns_match_table() {
        let names: Vec<_> = Contact::default()
            .fields()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        let expected: Vec<_> = Table::Contact
            .columns()
            .iter()
            .map(|c| c.name)
            .filter(|name| *name != "contact_id")
            .collect();
        assert_eq!(names, expected);
    }
}
