//! ONS resource URNs: `urn:ons.gov.uk:id:<type>:DDD.DDD.DDDDD`.

use thiserror::Error;

const PREFIX: &str = "urn";
const NAMESPACE: &str = "ons.gov.uk";
const ID_MARKER: &str = "id";

/// Digit-group lengths of the identifier body.
const GROUPS: [usize; 3] = [3, 3, 5];
const BODY_LEN: usize = 13;

/// Id type of collection instrument URNs.
pub const INSTRUMENT: &str = "ci";
/// Id type of survey URNs, as carried in `surveyId`.
pub const SURVEY: &str = "survey";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrnError {
  #[error("expected 5 ':'-separated parts, found {0}")]
  PartCount(usize),

  #[error("urn must start with \"urn:ons.gov.uk:id\"")]
  Namespace,

  #[error("expected id type {expected:?}, found {found:?}")]
  IdType { expected: String, found: String },

  #[error("identifier {0:?} is not of the form DDD.DDD.DDDDD")]
  Body(String),
}

pub fn instrument_urn(reference: &str) -> String {
  format!("{PREFIX}:{NAMESPACE}:{ID_MARKER}:{INSTRUMENT}:{reference}")
}

/// Check that `uri` is a well-formed URN of the given id type. Says nothing
/// about whether the resource exists.
pub fn validate(uri: &str, id_type: &str) -> Result<(), UrnError> {
  let parts: Vec<&str> = uri.split(':').collect();
  let [prefix, namespace, marker, kind, body] = parts.as_slice() else {
    return Err(UrnError::PartCount(parts.len()));
  };

  if *prefix != PREFIX || *namespace != NAMESPACE || *marker != ID_MARKER {
    return Err(UrnError::Namespace);
  }
  if *kind != id_type {
    return Err(UrnError::IdType {
      expected: id_type.to_owned(),
      found:    (*kind).to_owned(),
    });
  }

  let groups: Vec<&str> = body.split('.').collect();
  let well_formed = body.len() == BODY_LEN
    && groups.len() == GROUPS.len()
    && groups
      .iter()
      .zip(GROUPS)
      .all(|(g, len)| g.len() == len && g.bytes().all(|b| b.is_ascii_digit()));

  if well_formed {
    Ok(())
  } else {
    Err(UrnError::Body((*body).to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_instrument_urn() {
    assert_eq!(instrument_urn("001.001.00002"), "urn:ons.gov.uk:id:ci:001.001.00002");
  }

  #[test]
  fn accepts_well_formed() {
    assert_eq!(validate("urn:ons.gov.uk:id:ci:001.001.00002", INSTRUMENT), Ok(()));
    assert_eq!(validate("urn:ons.gov.uk:id:survey:123.456.78901", SURVEY), Ok(()));
  }

  #[test]
  fn rejects_malformed() {
    assert_eq!(validate("urn:ons.gov.uk:id:ci", INSTRUMENT), Err(UrnError::PartCount(4)));
    assert_eq!(
      validate("urn:example.com:id:ci:001.001.00002", INSTRUMENT),
      Err(UrnError::Namespace)
    );
    assert!(matches!(
      validate("urn:ons.gov.uk:id:survey:001.001.00002", INSTRUMENT),
      Err(UrnError::IdType { .. })
    ));
    assert!(matches!(
      validate("urn:ons.gov.uk:id:ci:001.001.0000a", INSTRUMENT),
      Err(UrnError::Body(_))
    ));
    assert!(matches!(
      validate("urn:ons.gov.uk:id:ci:0010.01.00002", INSTRUMENT),
      Err(UrnError::Body(_))
    ));
  }
}
