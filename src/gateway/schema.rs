/// Structural description of the JSON a model must return
#[derive(Clone, Debug, PartialEq)]
pub enum OutputSchema {
    Object(Vec<Field>),
    Array(Box<OutputSchema>),
    String { one_of: Vec<String> },
    Number,
    Boolean,
}

/// Named object property
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: OutputSchema,
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: OutputSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl OutputSchema {
    pub fn object(fields: Vec<Field>) -> Self {
        OutputSchema::Object(fields)
    }

    pub fn array(items: OutputSchema) -> Self {
        OutputSchema::Array(Box::new(items))
    }

    pub fn string() -> Self {
        OutputSchema::String { one_of: Vec::new() }
    }

    pub fn string_enum(values: &[&str]) -> Self {
        OutputSchema::String {
            one_of: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn number() -> Self {
        OutputSchema::Number
    }

    pub fn boolean() -> Self {
        OutputSchema::Boolean
    }

    /// Render as an indented JSON-like template with `//` annotations
    pub fn render(&self) -> String {
        self.render_at(0)
    }

    fn render_at(&self, indent: usize) -> String {
        match self {
            OutputSchema::Object(fields) => {
                let spaces = " ".repeat(indent);
                let lines: Vec<String> = fields
                    .iter()
                    .enumerate()
                    .map(|(i, field)| {
                        let comma = if i + 1 < fields.len() { "," } else { "" };
                        let comment = field
                            .description
                            .as_ref()
                            .map(|d| format!(" // {}", d))
                            .unwrap_or_default();
                        format!(
                            "{}    \"{}\": {}{}{}",
                            spaces,
                            field.name,
                            field.schema.render_at(indent + 4),
                            comma,
                            comment
                        )
                    })
                    .collect();
                format!("{{\n{}\n{}}}", lines.join("\n"), spaces)
            }
            OutputSchema::Array(items) => format!("[{}]", items.render_at(indent)),
            OutputSchema::String { one_of } if one_of.is_empty() => "string".to_string(),
            OutputSchema::String { one_of } => format!("string (one of: {})", one_of.join(", ")),
            OutputSchema::Number => "number".to_string(),
            OutputSchema::Boolean => "boolean".to_string(),
        }
    }
}

/// Format instructions appended to the system prompt
pub fn format_instructions(schema: &OutputSchema) -> String {
    let (kind, open, close) = match schema {
        OutputSchema::Array(_) => ("array", "bracket [", "bracket ]"),
        _ => ("object", "brace {", "brace }"),
    };

    format!(
        "You MUST return ONLY a JSON {kind} in exactly the following format, with no additional text or explanation:\n\n\
         {template}\n\n\
         Your response must:\n\
         1. Start with the opening {open}\n\
         2. Contain ONLY the JSON {kind}\n\
         3. End with the closing {close}\n\
         4. Include all required fields\n\
         5. Use the exact field names shown\n\
         6. Match the types specified\n\
         7. NOT include any explanatory text before or after the JSON",
        kind = kind,
        template = schema.render(),
        open = open,
        close = close,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_object() {
        let schema = OutputSchema::object(vec![
            Field::new(
                "shapes",
                OutputSchema::array(OutputSchema::object(vec![
                    Field::new("id", OutputSchema::string()),
                    Field::new("type", OutputSchema::string_enum(&["rectangle", "circle"]))
                        .describe("Shape type"),
                ])),
            ),
            Field::new("done", OutputSchema::boolean()),
        ]);

        let rendered = schema.render();
        let expected = "{\n    \"shapes\": [{\n        \"id\": string,\n        \"type\": string (one of: rectangle, circle) // Shape type\n    }],\n    \"done\": boolean\n}";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_instructions_for_array_schema() {
        let text = format_instructions(&OutputSchema::array(OutputSchema::string()));
        assert!(text.contains("ONLY a JSON array"));
        assert!(text.contains("[string]"));
        assert!(text.contains("opening bracket ["));
    }
}
