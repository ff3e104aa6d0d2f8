use template::{ExpandMode, Template};
use time::TimeContext;

/// One `NAME/LEVEL` entry from the field list. Both parts may contain placeholders.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: Template,
    pub level: Option<Template>,
}

impl FieldSpec {
    /// Parse `NAME` or `NAME/LEVEL`.
    pub fn parse(text: &str) -> Result<Self, template::Error> {
        let (name, level) = match text.split_once('/') {
            Some((name, level)) => (name.trim(), Some(level.trim())),
            None => (text.trim(), None),
        };
        Ok(Self {
            name: Template::parse(name)?,
            level: level
                .filter(|l| !l.is_empty())
                .map(Template::parse)
                .transpose()?,
        })
    }

    fn render(&self, ctx: &TimeContext, out: &mut String) -> Result<(), template::Error> {
        out.push_str("{ name=\"");
        out.push_str(&self.name.expand(ctx, ExpandMode::Strict)?);
        out.push_str("\"; ");
        if let Some(level) = &self.level {
            out.push_str("level=\"");
            out.push_str(&level.expand(ctx, ExpandMode::Strict)?);
            out.push_str("\"; ");
        }
        out.push('}');
        Ok(())
    }
}

/// The `DATA_FIELD` value: one `{ name="..."; level="..."; }` entry per field, comma-joined.
pub fn data_field(fields: &[FieldSpec], ctx: &TimeContext) -> Result<String, template::Error> {
    let mut out = String::with_capacity(fields.len() * 32);
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        field.render(ctx, &mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_data_field() -> Result<()> {
        let fields = [
            FieldSpec::parse("TMP/P500")?,
            FieldSpec::parse("{custom} / Z2")?,
            FieldSpec::parse("APCP")?,
        ];
        let ctx = TimeContext::wildcard().with_custom("HGT");
        assert_eq!(
            data_field(&fields, &ctx)?,
            "{ name=\"TMP\"; level=\"P500\"; },{ name=\"HGT\"; level=\"Z2\"; },{ name=\"APCP\"; }"
        );
        assert_eq!(data_field(&[], &ctx)?, "");
        Ok(())
    }

    #[test]
    fn test_wildcard_in_field_fails() -> Result<()> {
        let fields = [FieldSpec::parse("APCP_{lead?fmt=%2H}/A06")?];
        assert!(matches!(
            data_field(&fields, &TimeContext::wildcard()),
            Err(template::Error::UnresolvedWildcard { .. })
        ));
        Ok(())
    }
}
