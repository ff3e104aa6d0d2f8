use regex::Regex;

use time::{Axis, DateFields, DateFormat, Lead, LeadFormat, TimeContext};

use super::Error;

use super::template::{Segment, Template};

#[derive(Debug, Clone)]
enum Group {
    Init(DateFormat),
    Valid(DateFormat),
    Lead(LeadFormat),
    Custom,
}

/// The reverse of a `Template`: matches a relative path and recovers
/// the time values encoded in it.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    groups: Vec<Group>,
}

impl Pattern {
    pub(crate) fn new(template: &Template) -> Result<Self, Error> {
        let mut re = String::from("^");
        let mut groups = Vec::new();

        for seg in template.segments() {
            match seg {
                Segment::Literal(s) => push_literal(&mut re, s),
                Segment::Init(fmt) => {
                    re.push_str(&format!("({})", fmt.regex_source()));
                    groups.push(Group::Init(fmt.clone()));
                }
                Segment::Valid(fmt) => {
                    re.push_str(&format!("({})", fmt.regex_source()));
                    groups.push(Group::Valid(fmt.clone()));
                }
                Segment::Lead(fmt) => {
                    re.push_str(&format!("({})", fmt.regex_source()));
                    groups.push(Group::Lead(fmt.clone()));
                }
                Segment::Custom => {
                    re.push_str("([^/]*?)");
                    groups.push(Group::Custom);
                }
            }
        }
        re.push('$');

        let regex = Regex::new(&re)
            .map_err(|e| Error::Malformed(template.as_str().to_owned(), e.to_string()))?;
        Ok(Self { regex, groups })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Recover the time context encoded in `path` (relative to the search root).
    ///
    /// Axes the template never mentions are wildcards. If two of init, valid
    /// and lead are recovered, the third is derived. Returns `None` if the path
    /// does not match, if placeholders for the same axis disagree,
    /// or if the recovered times are inconsistent.
    ///
    /// Several placeholders for one date axis are combined field by field,
    /// so `{init?fmt=%Y%m%d}/{init?fmt=%H}` recovers a full init time.
    pub fn match_path(&self, path: &str) -> Option<TimeContext> {
        let caps = self.regex.captures(path)?;

        let mut init: Option<DateFields> = None;
        let mut valid: Option<DateFields> = None;
        let mut lead: Option<Lead> = None;
        let mut custom: Option<&str> = None;

        for (idx, group) in self.groups.iter().enumerate() {
            let text = caps.get(idx + 1)?.as_str();
            match group {
                Group::Init(fmt) => merge_fields(&mut init, fmt.parse_fields(text).ok()?)?,
                Group::Valid(fmt) => merge_fields(&mut valid, fmt.parse_fields(text).ok()?)?,
                Group::Lead(fmt) => merge(&mut lead, fmt.parse_value(text).ok()?)?,
                Group::Custom => merge(&mut custom, text)?,
            }
        }

        let init = match init {
            Some(fields) => Some(fields.to_timestamp()?),
            None => None,
        };
        let valid = match valid {
            Some(fields) => Some(fields.to_timestamp()?),
            None => None,
        };

        TimeContext::new(
            Axis::from(init),
            Axis::from(valid),
            Axis::from(lead),
            custom.unwrap_or_default(),
        )
        .ok()
    }
}

/// Record `value` in `slot`, or fail if a different value is already there.
fn merge<T: PartialEq>(slot: &mut Option<T>, value: T) -> Option<()> {
    match slot {
        Some(prev) if *prev != value => None,
        Some(_) => Some(()),
        None => {
            *slot = Some(value);
            Some(())
        }
    }
}

fn merge_fields(slot: &mut Option<DateFields>, value: DateFields) -> Option<()> {
    match slot {
        Some(prev) => prev.merge(&value).then_some(()),
        None => {
            *slot = Some(value);
            Some(())
        }
    }
}

fn push_literal(re: &mut String, literal: &str) {
    let mut buf = [0u8; 4];
    for c in literal.chars() {
        match c {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ExpandMode;
    use anyhow::Result;
    use chrono::NaiveDate;
    use time::Timestamp;

    fn ts(d: u32, h: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2016, 9, d)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_match_derives_valid() -> Result<()> {
        let p = Template::parse("{init?fmt=%Y%m%d}/f_{init?fmt=%H}_F{lead?fmt=%3H}.nc")?.pattern()?;
        let ctx = p.match_path("20160929/f_12_F006.nc").unwrap();
        assert_eq!(ctx.init(), &Axis::At(ts(29, 12)));
        assert_eq!(ctx.lead(), &Axis::At(Lead::from_hours(6)));
        assert_eq!(ctx.valid(), &Axis::At(ts(29, 18)));
        Ok(())
    }

    #[test]
    fn test_unreferenced_axes_are_wildcards() -> Result<()> {
        let p = Template::parse("obs_{valid?fmt=%Y%m%d%H}.nc")?.pattern()?;
        let ctx = p.match_path("obs_2016092906.nc").unwrap();
        assert_eq!(ctx.valid(), &Axis::At(ts(29, 6)));
        assert!(ctx.init().is_any());
        assert!(ctx.lead().is_any());
        Ok(())
    }

    #[test]
    fn test_partial_formats_need_a_year() -> Result<()> {
        let p = Template::parse("f_{init?fmt=%H}.nc")?.pattern()?;
        assert!(p.match_path("f_12.nc").is_none());
        Ok(())
    }

    #[test]
    fn test_no_match() -> Result<()> {
        let p = Template::parse("{init?fmt=%Y%m%d%H}/FCST_F{lead?fmt=%3H}.dat")?.pattern()?;
        assert!(p.match_path("2016092900/ANLY_F000.dat").is_none());
        assert!(p.match_path("2016092900/FCST_F000.dat.bak").is_none());
        assert!(p.match_path("x/2016092900/FCST_F000.dat").is_none());
        // month 13
        assert!(p.match_path("2016132900/FCST_F000.dat").is_none());
        Ok(())
    }

    #[test]
    fn test_conflicting_repeats() -> Result<()> {
        let p = Template::parse("{init?fmt=%Y%m%d}/{init?fmt=%Y%m%d%H}.nc")?.pattern()?;
        assert!(p.match_path("20160929/2016092912.nc").is_some());
        assert!(p.match_path("20160929/2016093000.nc").is_none());
        Ok(())
    }

    #[test]
    fn test_inconsistent_times() -> Result<()> {
        let p = Template::parse("{init?fmt=%Y%m%d%H}_{valid?fmt=%Y%m%d%H}_{lead?fmt=%2H}")?.pattern()?;
        assert!(p.match_path("2016092900_2016092906_06").is_some());
        assert!(p.match_path("2016092900_2016092906_03").is_none());
        Ok(())
    }

    #[test]
    fn test_wildcards() -> Result<()> {
        let p = Template::parse("*/gfs.{init?fmt=%Y%m%d}.t{init?fmt=%H}z.?.{lead?fmt=%2H}")?.pattern()?;
        assert!(p.match_path("any_dir/gfs.20160929.t00z.a.06").is_some());
        assert!(p.match_path("a/b/gfs.20160929.t00z.a.06").is_none());
        assert!(p.match_path("any_dir/gfs.20160929.t00z.ab.06").is_none());
        Ok(())
    }

    #[test]
    fn test_custom() -> Result<()> {
        let p = Template::parse("{custom}/{valid?fmt=%Y%m%d}.nc")?.pattern()?;
        let ctx = p.match_path("TMP/20160929.nc").unwrap();
        assert_eq!(ctx.custom(), "TMP");
        Ok(())
    }

    #[test]
    fn test_expand_then_match_recovers_context() -> Result<()> {
        let t = Template::parse("{init?fmt=%Y%m%d%H}/FCST_TILE_F{lead?fmt=%3H}_{valid?fmt=%Y%j%H}.dat")?;
        let p = t.pattern()?;
        for (d, h, lead) in [(1, 0, 0), (29, 12, 6), (30, 18, 240), (29, 0, -6)] {
            let ctx = TimeContext::new(
                Axis::At(ts(d, h)),
                Axis::Any,
                Axis::At(Lead::from_hours(lead)),
                "",
            )?;
            let name = t.expand(&ctx, ExpandMode::Strict)?;
            assert_eq!(p.match_path(&name), Some(ctx), "round trip of {name}");
        }
        Ok(())
    }
}
