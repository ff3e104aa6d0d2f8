use std::fmt;

use syntax::ast;
use time::{Axis, DateFormat, LeadFormat, TimeContext, ALL_TOKEN, DEFAULT_DATE_FMT, DEFAULT_LEAD_FMT};

use super::{Error, Pattern};

/// Whether a wildcard axis may be rendered as `ALL` or must fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandMode {
    /// Any placeholder on a wildcard axis is an `UnresolvedWildcard` error.
    Strict,
    /// Placeholders on wildcard axes render as `ALL` (used for list-file and output names).
    AllowWildcards,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Init(DateFormat),
    Valid(DateFormat),
    Lead(LeadFormat),
    Custom,
}

/// A filename template, parsed once from configuration.
///
/// Placeholders are `{init}`, `{valid}`, `{lead}` and `{custom}`; the first three
/// take an optional `?fmt=` option. Literal text may contain `*` and `?` wildcards,
/// which expand verbatim and match any characters within one path component
/// when the template is used in reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Result<Self, Error> {
        let malformed = |msg: String| Error::Malformed(text.to_owned(), msg);

        let ast = syntax::parse_template(text).map_err(|e| malformed(e.to_string()))?;
        let mut segments = Vec::with_capacity(ast.len());

        for seg in ast {
            let placeholder = match seg {
                ast::Segment::Literal(s) => {
                    segments.push(Segment::Literal(s.to_owned()));
                    continue;
                }
                ast::Segment::Placeholder(p) => p,
            };

            if let Some((k, _)) = placeholder.options.iter().find(|(k, _)| *k != "fmt") {
                return Err(malformed(format!(
                    "unsupported option '{k}' on placeholder '{}'",
                    placeholder.name
                )));
            }
            let fmt = placeholder.option("fmt");

            let segment = match placeholder.name {
                "init" | "valid" => {
                    let date_fmt = DateFormat::parse(fmt.unwrap_or(DEFAULT_DATE_FMT))
                        .map_err(|e| malformed(e.to_string()))?;
                    if placeholder.name == "init" {
                        Segment::Init(date_fmt)
                    } else {
                        Segment::Valid(date_fmt)
                    }
                }
                "lead" => Segment::Lead(
                    LeadFormat::parse(fmt.unwrap_or(DEFAULT_LEAD_FMT))
                        .map_err(|e| malformed(e.to_string()))?,
                ),
                "custom" => {
                    if fmt.is_some() {
                        return Err(malformed("'custom' placeholder takes no format".to_owned()));
                    }
                    Segment::Custom
                }
                other => return Err(malformed(format!("unknown placeholder '{other}'"))),
            };
            segments.push(segment);
        }

        Ok(Self {
            source: text.to_owned(),
            segments,
        })
    }

    /// The text this template was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Substitute the time values of `ctx` into the template. Pure; no I/O.
    pub fn expand(&self, ctx: &TimeContext, mode: ExpandMode) -> Result<String, Error> {
        let mut out = String::with_capacity(self.source.len() + 16);
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Init(fmt) => {
                    let s = self.resolve(ctx.init(), "init", mode, |t| fmt.render(t))?;
                    out.push_str(&s);
                }
                Segment::Valid(fmt) => {
                    let s = self.resolve(ctx.valid(), "valid", mode, |t| fmt.render(t))?;
                    out.push_str(&s);
                }
                Segment::Lead(fmt) => {
                    let s = self.resolve(ctx.lead(), "lead", mode, |l| fmt.render(l))?;
                    out.push_str(&s);
                }
                Segment::Custom => out.push_str(ctx.custom()),
            }
        }
        Ok(out)
    }

    fn resolve<T, F>(
        &self,
        axis: &Axis<T>,
        axis_name: &'static str,
        mode: ExpandMode,
        render: F,
    ) -> Result<String, Error>
    where
        F: FnOnce(&T) -> String,
    {
        match (axis, mode) {
            (Axis::At(v), _) => Ok(render(v)),
            (Axis::Any, ExpandMode::AllowWildcards) => Ok(ALL_TOKEN.to_owned()),
            (Axis::Any, ExpandMode::Strict) => Err(Error::UnresolvedWildcard {
                template: self.source.clone(),
                axis: axis_name,
            }),
        }
    }

    /// Build the regular expression that recovers time values from names this template produces.
    pub fn pattern(&self) -> Result<Pattern, Error> {
        Pattern::new(self)
    }

    /// Leading directories of the template that contain no placeholders or wildcards.
    /// Discovery can start its walk there instead of at the search root.
    pub fn static_dir_prefix(&self) -> &str {
        let lead_literal = match self.segments.first() {
            Some(Segment::Literal(s)) => s.as_str(),
            _ => return "",
        };
        // a fully literal template's last component is a file name, not a dir:
        let cut = lead_literal
            .find(['*', '?'])
            .unwrap_or(lead_literal.len());
        match lead_literal[..cut].rfind('/') {
            Some(idx) => &lead_literal[..idx],
            None => "",
        }
    }

    /// Number of `/`-separated components a matching relative path has.
    pub fn component_count(&self) -> usize {
        self.source.matches('/').count() + 1
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use time::{Lead, Timestamp};

    fn ts(d: u32, h: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2016, 9, d)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn init_lead(d: u32, h: u32, lead: i64) -> TimeContext {
        TimeContext::new(Axis::At(ts(d, h)), Axis::Any, Axis::At(Lead::from_hours(lead)), "").unwrap()
    }

    #[test]
    fn test_expand() -> Result<()> {
        let t = Template::parse("{init?fmt=%Y%m%d}/FCST_{valid?fmt=%Y%m%d%H}_F{lead?fmt=%3H}.nc")?;
        let s = t.expand(&init_lead(29, 0, 30), ExpandMode::Strict)?;
        assert_eq!(s, "20160929/FCST_2016093006_F030.nc");
        Ok(())
    }

    #[test]
    fn test_default_formats() -> Result<()> {
        let t = Template::parse("{init}_{lead}")?;
        assert_eq!(t.expand(&init_lead(29, 12, 1), ExpandMode::Strict)?, "20160929120000_3600");
        Ok(())
    }

    #[test]
    fn test_custom() -> Result<()> {
        let t = Template::parse("{custom}/file.nc")?;
        let ctx = init_lead(29, 0, 0).with_custom("TMP");
        assert_eq!(t.expand(&ctx, ExpandMode::Strict)?, "TMP/file.nc");
        Ok(())
    }

    #[test]
    fn test_wildcard_modes() -> Result<()> {
        let t = Template::parse("grid_diag_{init?fmt=%Y%m%d%H}_{lead?fmt=%3H}.nc")?;
        let ctx = TimeContext::new(Axis::At(ts(29, 0)), Axis::Any, Axis::Any, "")?;
        assert_eq!(
            t.expand(&ctx, ExpandMode::AllowWildcards)?,
            "grid_diag_2016092900_ALL.nc"
        );
        let err = t.expand(&ctx, ExpandMode::Strict).unwrap_err();
        assert!(matches!(err, Error::UnresolvedWildcard { axis: "lead", .. }));
        Ok(())
    }

    #[test]
    fn test_expand_is_deterministic() -> Result<()> {
        let t = Template::parse("{valid?fmt=%Y%j%H}_*")?;
        let ctx = init_lead(29, 0, 6);
        assert_eq!(t.expand(&ctx, ExpandMode::Strict)?, t.expand(&ctx, ExpandMode::Strict)?);
        Ok(())
    }

    #[test]
    fn test_malformed() {
        for bad in [
            "{init",
            "{foo}",
            "{init?fmt=%Q}",
            "{lead?fmt=%3X}",
            "{custom?fmt=%Y}",
            "{lead?fmt=%100000H}",
            "{init?shift=60}",
        ] {
            assert!(
                matches!(Template::parse(bad), Err(Error::Malformed(..))),
                "expected {bad} to be malformed"
            );
        }
    }

    #[test]
    fn test_static_dir_prefix() -> Result<()> {
        assert_eq!(Template::parse("a/b/{init}/c.nc")?.static_dir_prefix(), "a/b");
        assert_eq!(Template::parse("a/b*/{init}/c.nc")?.static_dir_prefix(), "a");
        assert_eq!(Template::parse("{init}/c.nc")?.static_dir_prefix(), "");
        assert_eq!(Template::parse("file_{init}.nc")?.static_dir_prefix(), "");
        assert_eq!(Template::parse("a/file.nc")?.static_dir_prefix(), "a");
        assert_eq!(Template::parse("a/b/{init}/c.nc")?.component_count(), 4);
        Ok(())
    }
}
