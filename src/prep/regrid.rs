/// Optional regridding settings, rendered as a dictionary for the tool's config parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegridSpec {
    pub to_grid: Option<String>,
    pub method: Option<String>,
    pub width: Option<String>,
    pub vld_thresh: Option<String>,
    pub shape: Option<String>,
}

impl RegridSpec {
    pub fn is_empty(&self) -> bool {
        self.to_grid.is_none()
            && self.method.is_none()
            && self.width.is_none()
            && self.vld_thresh.is_none()
            && self.shape.is_none()
    }

    /// `regrid = {to_grid = FCST;method = BILIN;}` with only the items that are set,
    /// or an empty string if none are.
    pub fn dict(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut s = String::from("regrid = {");
        let to_grid = self.to_grid.as_deref().map(format_to_grid);
        let items = [
            ("to_grid", to_grid.as_deref()),
            ("method", self.method.as_deref()),
            ("width", self.width.as_deref()),
            ("vld_thresh", self.vld_thresh.as_deref()),
            ("shape", self.shape.as_deref()),
        ];
        for (key, value) in items {
            if let Some(value) = value {
                s.push_str(key);
                s.push_str(" = ");
                s.push_str(value);
                s.push(';');
            }
        }
        s.push('}');
        s
    }
}

/// Grid keywords stay bare; anything else (a grid name or file path) is quoted.
fn format_to_grid(value: &str) -> String {
    let upper = value.trim().to_ascii_uppercase();
    match upper.as_str() {
        "NONE" | "FCST" | "OBS" => upper,
        _ => format!("\"{}\"", value.trim().trim_matches('"')),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dict() {
        assert_eq!(RegridSpec::default().dict(), "");

        let spec = RegridSpec {
            to_grid: Some("fcst".into()),
            method: Some("BILIN".into()),
            width: Some("2".into()),
            ..Default::default()
        };
        assert_eq!(spec.dict(), "regrid = {to_grid = FCST;method = BILIN;width = 2;}");

        let spec = RegridSpec {
            to_grid: Some("G104".into()),
            shape: Some("SQUARE".into()),
            ..Default::default()
        };
        assert_eq!(spec.dict(), "regrid = {to_grid = \"G104\";shape = SQUARE;}");
    }
}
