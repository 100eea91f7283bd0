//! Status progression: where a case stands within its case type's stages.

use docket_core::record::StatusStep;

use crate::wire::StatusType;

/// Build the ordered progression for a case.
///
/// `case_type_statuses` are the status-type URLs of the case's type, `catalog`
/// is every known status type and `current` is the status type of the case's
/// current status. Stages are ordered by sequence number; the ones before the
/// current stage are completed.
///
/// Returns `None` when the case has no current status, or when its current
/// status type is not one of the case type's stages. A returned progression
/// always contains exactly one current step.
pub fn status_progression<'a>(
  case_type_statuses: &[String],
  catalog: impl IntoIterator<Item = &'a StatusType>,
  current: Option<&str>,
) -> Option<Vec<StatusStep>> {
  let current = current?;

  let mut stages: Vec<&StatusType> = catalog
    .into_iter()
    .filter(|t| case_type_statuses.contains(&t.url))
    .collect();
  stages.sort_by(|a, b| {
    a.volgnummer.cmp(&b.volgnummer).then_with(|| a.url.cmp(&b.url))
  });
  stages.dedup_by(|a, b| a.url == b.url);

  let position = stages.iter().position(|t| t.url == current)?;

  Some(
    stages
      .into_iter()
      .enumerate()
      .map(|(i, t)| StatusStep {
        status_type: t.url.clone(),
        label:       t.omschrijving.clone(),
        sequence:    t.volgnummer,
        is_final:    t.is_eindstatus,
        completed:   i < position,
        current:     i == position,
      })
      .collect(),
  )
}
