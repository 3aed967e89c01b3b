//! Location normalizer.
//!
//! Stored locations come in four legacy shapes:
//!
//! | Shape      | Example                                              |
//! |------------|------------------------------------------------------|
//! | structured | `{'city': '呼和浩特', 'province': '内蒙古自治区', 'latitude': 40.8}` |
//! | colon pair | `呼和浩特:内蒙古自治区`                              |
//! | comma list | `杭州,浙江` or `杭州市,浙江省,中国`                  |
//! | bare name  | `陕西省` or `榆林`                                   |
//!
//! [`classify`] tags a raw string with its shape; [`Normalizer`] converts each
//! shape to the canonical `City,Province,Country` form and then runs the suffix
//! tables over the city and province positions. Every step is idempotent.

use tracing::debug;

use crate::suffix::{LocationTables, PROVINCE_MARKERS};

// ─── Structured literal ──────────────────────────────────────────────────────

/// The fields we care about from a structured location literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredLocation {
  pub city:     Option<String>,
  pub province: Option<String>,
  pub country:  Option<String>,
}

impl StructuredLocation {
  /// Cheap pre-check: a leading brace and a latitude key.
  pub fn looks_structured(raw: &str) -> bool {
    raw.starts_with('{') && raw.contains("latitude")
  }

  /// Parse a flat key/value literal such as
  /// `{'latitude': 40.8, 'city': '呼和浩特', 'province': None}`.
  ///
  /// Returns `None` if the literal is malformed. Empty or non-string values
  /// count as absent.
  pub fn try_parse(raw: &str) -> Option<Self> {
    let fields = LiteralParser::new(raw).parse_document()?;

    let mut out = Self::default();
    for (key, value) in fields {
      let Literal::Str(value) = value else { continue };
      if value.is_empty() {
        continue;
      }
      match key.as_str() {
        "city" => out.city = Some(value),
        "province" => out.province = Some(value),
        "country" => out.country = Some(value),
        _ => {}
      }
    }
    Some(out)
  }
}

#[derive(Debug, PartialEq)]
enum Literal {
  Str(String),
  Other,
}

/// Minimal recursive-descent reader for the dict literals the legacy importer
/// wrote. Anything it does not understand makes the whole parse fail.
struct LiteralParser<'a> {
  chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> LiteralParser<'a> {
  fn new(input: &'a str) -> Self { Self { chars: input.chars().peekable() } }

  fn skip_ws(&mut self) {
    while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
  }

  fn eat(&mut self, expected: char) -> Option<()> {
    self.chars.next_if_eq(&expected).map(|_| ())
  }

  fn parse_document(mut self) -> Option<Vec<(String, Literal)>> {
    self.skip_ws();
    let fields = self.parse_map()?;
    self.skip_ws();
    self.chars.peek().is_none().then_some(fields)
  }

  fn parse_map(&mut self) -> Option<Vec<(String, Literal)>> {
    self.eat('{')?;
    let mut fields = Vec::new();

    loop {
      self.skip_ws();
      if self.eat('}').is_some() {
        return Some(fields);
      }

      let key = self.parse_string()?;
      self.skip_ws();
      self.eat(':')?;
      self.skip_ws();
      let value = self.parse_value()?;
      fields.push((key, value));

      self.skip_ws();
      match self.chars.next()? {
        ',' => continue,
        '}' => return Some(fields),
        _ => return None,
      }
    }
  }

  fn parse_string(&mut self) -> Option<String> {
    let quote = self.chars.next_if(|c| *c == '\'' || *c == '"')?;
    let mut out = String::new();
    loop {
      match self.chars.next()? {
        '\\' => match self.chars.next()? {
          'n' => out.push('\n'),
          't' => out.push('\t'),
          other => out.push(other),
        },
        c if c == quote => return Some(out),
        c => out.push(c),
      }
    }
  }

  fn parse_value(&mut self) -> Option<Literal> {
    match *self.chars.peek()? {
      '\'' | '"' => self.parse_string().map(Literal::Str),
      '{' | '[' | '(' => {
        self.skip_nested()?;
        Some(Literal::Other)
      }
      _ => {
        let mut token = String::new();
        while let Some(c) =
          self.chars.next_if(|c| !matches!(*c, ',' | '}' | ']' | ')') && !c.is_whitespace())
        {
          token.push(c);
        }
        let scalar = matches!(token.as_str(), "None" | "True" | "False")
          || token.parse::<f64>().is_ok_and(f64::is_finite);
        scalar.then_some(Literal::Other)
      }
    }
  }

  /// Skip one balanced bracketed value, honouring quoted strings inside it.
  fn skip_nested(&mut self) -> Option<()> {
    let mut depth = 0usize;
    loop {
      match *self.chars.peek()? {
        '\'' | '"' => {
          self.parse_string()?;
          continue;
        }
        '{' | '[' | '(' => depth += 1,
        '}' | ']' | ')' => {
          depth = depth.checked_sub(1)?;
          if depth == 0 {
            self.chars.next();
            return Some(());
          }
        }
        _ => {}
      }
      self.chars.next();
    }
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// The legacy shape a stored location string is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationShape<'a> {
  /// Null, empty, or whitespace only.
  Empty,
  Structured(StructuredLocation),
  /// Comma separated segments, already canonical or missing the country.
  CommaList(Vec<&'a str>),
  /// `City:Province`.
  ColonPair(&'a str),
  /// A single token; `province_like` when it carries a province marker.
  Bare { name: &'a str, province_like: bool },
}

/// Decide which legacy shape `raw` is in.
///
/// A literal that looks structured but does not parse is classified by the
/// remaining rules.
pub fn classify(raw: &str) -> LocationShape<'_> {
  if raw.trim().is_empty() {
    return LocationShape::Empty;
  }

  if StructuredLocation::looks_structured(raw) {
    match StructuredLocation::try_parse(raw) {
      Some(parsed) => return LocationShape::Structured(parsed),
      None => debug!(raw, "malformed structured location, falling back"),
    }
  }

  if raw.contains(',') {
    LocationShape::CommaList(raw.split(',').collect())
  } else if raw.contains(':') {
    LocationShape::ColonPair(raw)
  } else {
    LocationShape::Bare {
      name:          raw,
      province_like: PROVINCE_MARKERS.iter().any(|m| raw.contains(m)),
    }
  }
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Which correction a pass over the store applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionPass {
  /// Shape conversion only.
  Format,
  /// City suffix table on the first segment.
  CitySuffix,
  /// Province suffix table on the second segment.
  ProvinceSuffix,
  /// All of the above, in that order.
  All,
}

/// Converts stored location strings to `City,Province,Country`.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
  tables: &'a LocationTables,
}

impl<'a> Normalizer<'a> {
  pub fn new(tables: &'a LocationTables) -> Self { Self { tables } }

  /// Shape conversion followed by the city suffix pass. `None` and empty
  /// input both give an empty string.
  pub fn normalize(&self, raw: Option<&str>) -> String {
    let shaped = self.canonicalize_shape(raw.unwrap_or_default());
    self.apply_city_suffix(&shaped)
  }

  /// Run one correction pass over a stored value.
  pub fn correct(&self, raw: &str, pass: CorrectionPass) -> String {
    match pass {
      CorrectionPass::Format => self.canonicalize_shape(raw),
      CorrectionPass::CitySuffix => self.apply_city_suffix(raw),
      CorrectionPass::ProvinceSuffix => self.apply_province_suffix(raw),
      CorrectionPass::All => {
        let normalized = self.normalize(Some(raw));
        self.apply_province_suffix(&normalized)
      }
    }
  }

  /// Convert any recognised shape to comma form with a trailing country.
  pub fn canonicalize_shape(&self, raw: &str) -> String {
    let country = self.tables.country.as_str();

    match classify(raw) {
      LocationShape::Empty => String::new(),
      LocationShape::Structured(s) => match (s.city, s.province) {
        (Some(city), Some(province)) => format!("{city},{province},{country}"),
        (None, Some(province)) => format!("{province},{country}"),
        (Some(city), None) => format!("{city},{country}"),
        (None, None) => String::new(),
      },
      LocationShape::CommaList(parts) => {
        if self.ends_in_country(&parts) {
          raw.to_owned()
        } else {
          format!("{raw},{country}")
        }
      }
      LocationShape::ColonPair(pair) => format!("{},{country}", pair.replace(':', ",")),
      LocationShape::Bare { name, .. } => format!("{name},{country}"),
    }
  }

  /// The trailing segment counts as a country if it contains the country
  /// marker or is longer than one character.
  // NOTE: a two-character province without the marker ("陕西") also passes;
  // legacy rows rely on this, so it stays.
  fn ends_in_country(&self, parts: &[&str]) -> bool {
    match parts {
      [_, .., last] => {
        last.contains(self.tables.country_marker) || last.chars().count() > 1
      }
      _ => false,
    }
  }

  /// Replace the first segment with its suffixed form if it is a known
  /// exception. Strings without a comma are left alone.
  pub fn apply_city_suffix(&self, loc: &str) -> String {
    let Some((city, rest)) = loc.split_once(',') else {
      return loc.to_owned();
    };
    match self.tables.cities.lookup(city) {
      Some(canonical) => format!("{canonical},{rest}"),
      None => loc.to_owned(),
    }
  }

  /// Replace the province segment with its suffixed form. Only applies when
  /// the segment is bracketed by commas, i.e. at least three segments.
  pub fn apply_province_suffix(&self, loc: &str) -> String {
    let mut parts: Vec<&str> = loc.split(',').collect();
    if parts.len() < 3 {
      return loc.to_owned();
    }
    match self.tables.provinces.lookup(parts[1]) {
      Some(canonical) => {
        parts[1] = canonical;
        parts.join(",")
      }
      None => loc.to_owned(),
    }
  }
}
