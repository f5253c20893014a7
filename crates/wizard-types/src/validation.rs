//! Schema checks for implementation configuration tables.
//!
//! Every pluggable implementation describes the TOML table it expects with a
//! [`Schema`]. The service validates each `implementations.<name>` table
//! against it before calling the implementation's factory.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

impl ValidationError {
	/// Prefixes the offending field with the enclosing table name.
	fn within(self, table: &str) -> Self {
		match self {
			Self::MissingField(f) => Self::MissingField(format!("{}.{}", table, f)),
			Self::InvalidValue { field, message } => Self::InvalidValue {
				field: format!("{}.{}", table, field),
				message,
			},
			Self::TypeMismatch {
				field,
				expected,
				actual,
			} => Self::TypeMismatch {
				field: format!("{}.{}", table, field),
				expected,
				actual,
			},
			other => other,
		}
	}

	fn mismatch(field: &str, expected: &str, value: &toml::Value) -> Self {
		Self::TypeMismatch {
			field: field.to_string(),
			expected: expected.to_string(),
			actual: value.type_str().to_string(),
		}
	}
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// Money or percentage: a string, integer or float that parses as a decimal.
	Decimal,
	/// A string restricted to a fixed set of values.
	OneOf(Vec<&'static str>),
	Array(Box<FieldType>),
	Table(Schema),
}

pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a check that runs after the type check passed.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		check_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of one TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Checks presence of required fields, then the type and custom
	/// validator of every field that is present.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::mismatch("root", "table", config))?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn check_type(name: &str, value: &toml::Value, expected: &FieldType) -> Result<(), ValidationError> {
	match expected {
		FieldType::String if !value.is_str() => {
			Err(ValidationError::mismatch(name, "string", value))
		},
		FieldType::Boolean if !value.is_bool() => {
			Err(ValidationError::mismatch(name, "boolean", value))
		},
		FieldType::String | FieldType::Boolean => Ok(()),
		FieldType::Integer { min, max } => {
			let n = value
				.as_integer()
				.ok_or_else(|| ValidationError::mismatch(name, "integer", value))?;
			if let Some(min) = min.filter(|min| n < *min) {
				return Err(ValidationError::InvalidValue {
					field: name.to_string(),
					message: format!("Value {} is less than minimum {}", n, min),
				});
			}
			if let Some(max) = max.filter(|max| n > *max) {
				return Err(ValidationError::InvalidValue {
					field: name.to_string(),
					message: format!("Value {} is greater than maximum {}", n, max),
				});
			}
			Ok(())
		},
		FieldType::Decimal => toml_decimal(value)
			.map(|_| ())
			.ok_or_else(|| ValidationError::mismatch(name, "decimal", value)),
		FieldType::OneOf(allowed) => {
			let s = value
				.as_str()
				.ok_or_else(|| ValidationError::mismatch(name, "string", value))?;
			if allowed.contains(&s) {
				Ok(())
			} else {
				Err(ValidationError::InvalidValue {
					field: name.to_string(),
					message: format!("'{}' is not one of {}", s, allowed.join(", ")),
				})
			}
		},
		FieldType::Array(inner) => {
			let items = value
				.as_array()
				.ok_or_else(|| ValidationError::mismatch(name, "array", value))?;
			for (i, item) in items.iter().enumerate() {
				check_type(&format!("{}[{}]", name, i), item, inner)?;
			}
			Ok(())
		},
		FieldType::Table(schema) => schema.validate(value).map_err(|e| e.within(name)),
	}
}

/// Reads a decimal from a TOML string, integer or float.
pub fn toml_decimal(value: &toml::Value) -> Option<Decimal> {
	match value {
		toml::Value::String(s) => Decimal::from_str(s).ok(),
		toml::Value::Integer(i) => Some(Decimal::from(*i)),
		toml::Value::Float(f) => Decimal::from_str(&f.to_string()).ok(),
		_ => None,
	}
}

/// Configuration schema of a pluggable implementation.
#[async_trait]
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(s: &str) -> toml::Value {
		toml::from_str(s).unwrap()
	}

	#[test]
	fn test_missing_required_field() {
		let schema = Schema::new(vec![Field::new("storage_path", FieldType::String)], vec![]);
		let err = schema.validate(&parse("other = 1")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(ref f) if f == "storage_path"));
	}

	#[test]
	fn test_integer_bounds() {
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"ttl",
				FieldType::Integer {
					min: Some(0),
					max: Some(10),
				},
			)],
		);
		assert!(schema.validate(&parse("ttl = 5")).is_ok());
		assert!(schema.validate(&parse("ttl = 11")).is_err());
		assert!(schema.validate(&parse("ttl = \"5\"")).is_err());
	}

	#[test]
	fn test_decimal_and_one_of() {
		let schema = Schema::new(
			vec![
				Field::new("price", FieldType::Decimal),
				Field::new("unit", FieldType::OneOf(vec!["pieces", "kilograms"])),
			],
			vec![],
		);
		assert!(schema
			.validate(&parse("price = \"12.50\"\nunit = \"pieces\""))
			.is_ok());
		assert!(schema.validate(&parse("price = 12\nunit = \"pieces\"")).is_ok());
		let err = schema
			.validate(&parse("price = 1.5\nunit = \"liters\""))
			.unwrap_err();
		assert!(err.to_string().contains("liters"));
	}

	#[test]
	fn test_nested_table_prefixes_field() {
		let inner = Schema::new(vec![Field::new("name", FieldType::String)], vec![]);
		let schema = Schema::new(vec![Field::new("client", FieldType::Table(inner))], vec![]);
		let err = schema.validate(&parse("[client]\nphone = \"1\"")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(ref f) if f == "client.name"));
	}
}
