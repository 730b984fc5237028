//! Generic fixed-width records.
//!
//! A [`Schema`] is an ordered list of field definitions with a declared total
//! width. A [`Record`] is one line built against a schema from a set of named
//! [`FieldValues`]; it is immutable once built.

use crate::error::{AchError, FieldError, Result};
use crate::field::{Field, FieldDefinition};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Sum of the widths of `fields`.
pub const fn fields_width(fields: &[FieldDefinition]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].width;
        i += 1;
    }
    total
}

/// Ordered layout of one physical line.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    /// Display name used in errors, e.g. `"file header"`.
    pub name: &'static str,
    /// Leading record type character.
    pub type_code: char,
    /// Required total width of a rendered line.
    pub width: usize,
    pub fields: &'static [FieldDefinition],
}

impl Schema {
    /// Declares a layout without checking its width. Static layouts pair this
    /// with a compile-time width assertion; other callers should prefer
    /// [`Schema::checked`].
    pub const fn new(
        name: &'static str,
        type_code: char,
        width: usize,
        fields: &'static [FieldDefinition],
    ) -> Self {
        Schema {
            name,
            type_code,
            width,
            fields,
        }
    }

    /// Declares a layout, failing once here when the field widths do not add
    /// up to `width`. Records built against it skip the check.
    pub fn checked(
        name: &'static str,
        type_code: char,
        width: usize,
        fields: &'static [FieldDefinition],
    ) -> Result<Self> {
        let schema = Schema::new(name, type_code, width, fields);
        schema.check_size()?;
        Ok(schema)
    }

    /// Sum of all field widths.
    pub const fn total_width(&self) -> usize {
        fields_width(self.fields)
    }

    /// Fails when field widths do not add up to the declared width.
    pub fn check_size(&self) -> Result<()> {
        let actual = self.total_width();
        if actual != self.width {
            return Err(AchError::SchemaSize {
                schema: self.name,
                actual,
                expected: self.width,
            });
        }
        Ok(())
    }

    pub fn definition(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|def| def.name == name)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|def| def.name).collect()
    }

    /// Names that are required and have no default, in layout order.
    pub fn required_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|def| def.needs_value())
            .map(|def| def.name)
            .collect()
    }
}

/// Named raw values supplied to a record, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    entries: Vec<(String, String)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name`, replacing any earlier value for it.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Sets `name` only when no value is present yet.
    pub fn insert_default(&mut self, name: &str, value: impl ToString) {
        if !self.contains(name) {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for FieldValues {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// One line of an ACH file, resolved against its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    schema: &'static Schema,
    fields: Vec<Field>,
}

impl Record {
    /// Builds a record, collecting every field failure into one error.
    pub fn new(schema: &'static Schema, values: FieldValues) -> Result<Self> {
        let unknown: Vec<String> = values
            .iter()
            .filter(|(name, _)| schema.definition(name).is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(AchError::UnknownFields {
                schema: schema.name,
                names: unknown,
            });
        }

        let mut fields = Vec::with_capacity(schema.fields.len());
        let mut failures: Vec<(&'static str, FieldError)> = Vec::new();
        for definition in schema.fields {
            match Field::new(*definition, values.get(definition.name)) {
                Ok(field) => fields.push(field),
                Err(err) => failures.push((definition.name, err)),
            }
        }
        if !failures.is_empty() {
            return Err(AchError::AggregateField {
                schema: schema.name,
                failures,
            });
        }

        Ok(Record { schema, fields })
    }

    /// Decodes a physical line by slicing it into consecutive field widths.
    /// Slices are not trimmed; they go through normal field resolution.
    pub fn from_line(schema: &'static Schema, line: &str) -> Result<Self> {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() != schema.width {
            return Err(AchError::LineWidth {
                expected: schema.width,
                actual: chars.len(),
            });
        }

        let mut values = FieldValues::new();
        let mut offset = 0;
        for definition in schema.fields {
            let end = offset + definition.width;
            let slice: String = chars[offset..end].iter().collect();
            values.insert(definition.name, slice);
            offset = end;
        }
        Record::new(schema, values)
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn type_code(&self) -> char {
        self.schema.type_code
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Concatenates field values in layout order.
    pub fn render_line(&self) -> String {
        let mut line = String::with_capacity(self.schema.width);
        for field in &self.fields {
            line.push_str(field.value());
        }
        line
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name() == name)
            .map(Field::value)
    }

    /// Rendered value of `name`, failing for names outside the schema.
    pub fn value(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| AchError::UnknownFields {
            schema: self.schema.name,
            names: vec![name.to_string()],
        })
    }

    /// Reads a numeric field; surrounding blanks are ignored.
    pub fn int_value(&self, name: &str) -> Result<u64> {
        let raw = self.value(name)?;
        raw.trim().parse().map_err(|_| AchError::InvalidNumber {
            field: name.to_string(),
            value: raw.to_string(),
        })
    }

    /// All rendered values keyed by field name, in layout order.
    pub fn to_field_values(&self) -> FieldValues {
        self.fields
            .iter()
            .map(|field| (field.name(), field.value()))
            .collect()
    }

    /// Returns a copy with one field re-resolved from `value`.
    pub fn with_value(&self, name: &str, value: &str) -> Result<Record> {
        let index = self
            .fields
            .iter()
            .position(|field| field.name() == name)
            .ok_or_else(|| AchError::UnknownFields {
                schema: self.schema.name,
                names: vec![name.to_string()],
            })?;
        let definition = *self.fields[index].definition();
        let field = Field::new(definition, Some(value)).map_err(|source| AchError::Field {
            field: definition.name,
            source,
        })?;

        let mut fields = self.fields.clone();
        fields[index] = field;
        Ok(Record {
            schema: self.schema,
            fields,
        })
    }

    /// Fails unless this record was built against `schema`.
    pub fn expect_schema(&self, schema: &'static Schema) -> Result<()> {
        if self.schema.type_code != schema.type_code {
            return Err(AchError::WrongRecordType {
                expected: schema.name,
                expected_code: schema.type_code,
                found: self.schema.type_code,
            });
        }
        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(field.name(), field.value())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    static PERSON_FIELDS: [FieldDefinition; 3] = [
        FieldDefinition::new("code", "Code", FieldType::Integer, 1).with_default("3"),
        FieldDefinition::new("name", "Name", FieldType::AlphaNumeric, 6),
        FieldDefinition::new("age", "Age", FieldType::Integer, 3),
    ];
    static PERSON: Schema = Schema::new("person", '3', 10, &PERSON_FIELDS);

    #[test]
    fn test_render_line_concatenates_in_order() {
        let record = Record::new(&PERSON, FieldValues::from([("name", "ANN"), ("age", "42")])).unwrap();
        assert_eq!(record.render_line(), "3ANN   042");
        assert_eq!(record.render_line().len(), PERSON.width);
        assert_eq!(record.get("name"), Some("ANN   "));
        assert_eq!(record.int_value("age").unwrap(), 42);
    }

    #[test]
    fn test_schema_size_mismatch() {
        assert_eq!(
            Schema::checked("person", '3', 10, &PERSON_FIELDS).unwrap(),
            PERSON
        );
        match Schema::checked("broken", '3', 12, &PERSON_FIELDS) {
            Err(AchError::SchemaSize {
                schema,
                actual,
                expected,
            }) => {
                assert_eq!(schema, "broken");
                assert_eq!(actual, 10);
                assert_eq!(expected, 12);
            }
            other => panic!("Expected SchemaSize, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_are_all_listed() {
        let values = FieldValues::from([("name", "ANN"), ("age", "1"), ("shoe", "9"), ("hat", "2")]);
        match Record::new(&PERSON, values) {
            Err(AchError::UnknownFields { names, .. }) => assert_eq!(names, vec!["shoe", "hat"]),
            other => panic!("Expected UnknownFields, got {:?}", other),
        }
    }

    #[test]
    fn test_all_field_failures_are_aggregated() {
        let err = Record::new(&PERSON, FieldValues::from([("age", "old")])).unwrap_err();
        assert_eq!(err.failed_fields(), vec!["name", "age"]);
    }

    #[test]
    fn test_from_line_round_trips() {
        let record = Record::from_line(&PERSON, "3BOB   007").unwrap();
        assert_eq!(record.get("name"), Some("BOB   "));
        assert_eq!(record.render_line(), "3BOB   007");
    }

    #[test]
    fn test_from_line_rejects_wrong_width() {
        assert!(matches!(
            Record::from_line(&PERSON, "3BOB"),
            Err(AchError::LineWidth {
                expected: 10,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_with_value_builds_new_record() {
        let record = Record::new(&PERSON, FieldValues::from([("name", "ANN"), ("age", "42")])).unwrap();
        let older = record.with_value("age", "43").unwrap();
        assert_eq!(older.get("age"), Some("043"));
        assert_eq!(record.get("age"), Some("042"));
        assert!(record.with_value("age", "x").is_err());
        assert!(record.with_value("shoe", "1").is_err());
    }

    #[test]
    fn test_required_names() {
        assert_eq!(PERSON.required_names(), vec!["name", "age"]);
        assert_eq!(PERSON.field_names(), vec!["code", "name", "age"]);
    }

    #[test]
    fn test_field_values_replace_and_default() {
        let mut values = FieldValues::new().with("a", 1).with("b", "x");
        values.insert("a", 2);
        values.insert_default("a", 3);
        values.insert_default("c", 4);
        assert_eq!(values.get("a"), Some("2"));
        assert_eq!(values.get("c"), Some("4"));
        assert_eq!(values.remove("b"), Some("x".to_string()));
        assert_eq!(values.len(), 2);
    }
}
