//! Startup hydration from query-string parameters
//!
//! Accepts `length`, `width`, `thickness` and `unit`, the same keys a shared
//! calculator link carries (`?length=10&width=5&thickness=20`).

use url::Url;

use super::{snap, Calculator, Field};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub length: Option<String>,
    pub width: Option<String>,
    pub thickness: Option<String>,
    pub unit: Option<String>,
}

impl QueryParams {
    /// Parse either a full URL or a bare query string (leading `?` optional).
    /// First occurrence of a key wins, unknown keys are ignored.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let query = match Url::parse(input) {
            Ok(url) if url.query().is_some() => url.query().unwrap_or_default().to_string(),
            _ => input.trim_start_matches('?').to_string(),
        };

        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "length" => &mut params.length,
                "width" => &mut params.width,
                "thickness" => &mut params.thickness,
                "unit" => &mut params.unit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Overlay values from `other` on top of these
    pub fn merge(mut self, other: QueryParams) -> Self {
        if other.length.is_some() {
            self.length = other.length;
        }
        if other.width.is_some() {
            self.width = other.width;
        }
        if other.thickness.is_some() {
            self.thickness = other.thickness;
        }
        if other.unit.is_some() {
            self.unit = other.unit;
        }
        self
    }

    pub fn has_values(&self) -> bool {
        self.length.is_some() || self.width.is_some() || self.thickness.is_some()
    }

    /// Thickness as the centimetre text the input field expects
    fn thickness_cm(&self) -> Option<String> {
        let raw = self.thickness.as_ref()?;
        if self.unit.as_deref() != Some("m") {
            return Some(raw.clone());
        }

        // Unparseable metres stay as typed so validation flags them
        match raw.trim().parse::<f64>() {
            Ok(metres) if metres.is_finite() => Some(snap(metres * 100.0).to_string()),
            _ => Some(raw.clone()),
        }
    }
}

impl Calculator {
    /// Populate fields from startup parameters, recomputing once if any
    /// field key was supplied.
    pub fn hydrate(&mut self, params: &QueryParams) {
        if !params.has_values() {
            return;
        }

        let fields = [
            (Field::Length, params.length.clone()),
            (Field::Width, params.width.clone()),
            (Field::Thickness, params.thickness_cm()),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                self.fields[field.index()].raw = value;
            }
        }

        tracing::info!(?params, "hydrated calculator from query");
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{ResultStatus, MSG_IDLE, MSG_NEEDS_INPUT};

    fn params(length: &str, width: &str, thickness: &str) -> QueryParams {
        QueryParams {
            length: Some(length.to_string()),
            width: Some(width.to_string()),
            thickness: Some(thickness.to_string()),
            unit: None,
        }
    }

    #[test]
    fn test_parse_bare_query() {
        let p = QueryParams::parse("length=10&width=5&thickness=20");
        assert_eq!(p, params("10", "5", "20"));

        let p = QueryParams::parse("?thickness=0.5&unit=m");
        assert_eq!(p.thickness.as_deref(), Some("0.5"));
        assert_eq!(p.unit.as_deref(), Some("m"));
        assert_eq!(p.length, None);
    }

    #[test]
    fn test_parse_full_url() {
        let p = QueryParams::parse("https://example.com/calc/?length=2&width=3&foo=bar");
        assert_eq!(p.length.as_deref(), Some("2"));
        assert_eq!(p.width.as_deref(), Some("3"));
        assert_eq!(p.thickness, None);
    }

    #[test]
    fn test_parse_decodes_and_keeps_first() {
        let p = QueryParams::parse("length=1%2E5&length=9&width=+2");
        assert_eq!(p.length.as_deref(), Some("1.5"));
        assert_eq!(p.width.as_deref(), Some(" 2"));
    }

    #[test]
    fn test_merge_overrides() {
        let base = QueryParams::parse("length=1&width=2");
        let merged = base.merge(QueryParams {
            width: Some("7".to_string()),
            ..Default::default()
        });
        assert_eq!(merged.length.as_deref(), Some("1"));
        assert_eq!(merged.width.as_deref(), Some("7"));
    }

    #[test]
    fn test_hydrate_computes_volume() {
        let mut calc = Calculator::new();
        calc.hydrate(&params("10", "5", "20"));
        assert_eq!(calc.status_text(), "필요 루베: 10.00");
        assert_eq!(calc.raw(Field::Thickness), "20");
    }

    #[test]
    fn test_hydrate_converts_metres() {
        let mut calc = Calculator::new();
        let mut p = params("2", "3", "0.5");
        p.unit = Some("m".to_string());
        calc.hydrate(&p);
        assert_eq!(calc.raw(Field::Thickness), "50");
        assert_eq!(calc.copy_text().as_deref(), Some("3.00"));
    }

    #[test]
    fn test_hydrate_metres_without_float_noise() {
        let mut calc = Calculator::new();
        calc.hydrate(&QueryParams {
            thickness: Some("0.07".to_string()),
            unit: Some("m".to_string()),
            ..Default::default()
        });
        assert_eq!(calc.raw(Field::Thickness), "7");
    }

    #[test]
    fn test_hydrate_huge_metres_stays_numeric() {
        let mut calc = Calculator::new();
        calc.hydrate(&QueryParams {
            thickness: Some("1e300".to_string()),
            unit: Some("m".to_string()),
            ..Default::default()
        });
        assert_eq!(calc.field(Field::Thickness).value, crate::calculator::FieldValue::Valid(1e300_f64 * 100.0));
        assert_eq!(calc.error_text(Field::Thickness), None);
    }

    #[test]
    fn test_hydrate_bad_metres_is_invalid() {
        let mut calc = Calculator::new();
        let mut p = params("2", "3", "thick");
        p.unit = Some("m".to_string());
        calc.hydrate(&p);
        assert_eq!(calc.raw(Field::Thickness), "thick");
        assert!(calc.error_text(Field::Thickness).is_some());
        assert_eq!(calc.result(), None);
    }

    #[test]
    fn test_hydrate_other_unit_is_centimetres() {
        let mut calc = Calculator::new();
        let mut p = params("2", "3", "50");
        p.unit = Some("cm".to_string());
        calc.hydrate(&p);
        assert_eq!(calc.copy_text().as_deref(), Some("3.00"));
    }

    #[test]
    fn test_hydrate_partial_prompts() {
        let mut calc = Calculator::new();
        calc.hydrate(&QueryParams {
            length: Some("4".to_string()),
            ..Default::default()
        });
        assert_eq!(calc.raw(Field::Length), "4");
        assert_eq!(calc.status(), ResultStatus::NeedsInput);
        assert_eq!(calc.status_text(), MSG_NEEDS_INPUT);
    }

    #[test]
    fn test_hydrate_without_values_stays_idle() {
        let mut calc = Calculator::new();
        calc.hydrate(&QueryParams {
            unit: Some("m".to_string()),
            ..Default::default()
        });
        assert_eq!(calc.status_text(), MSG_IDLE);
    }
}
