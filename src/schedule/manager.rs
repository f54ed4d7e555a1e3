use chrono::NaiveDate;

use crate::db::schedule_store::ScheduleStore;
use crate::error::{ManagerError, StoreError};
use crate::models::DailySchedule;
use crate::schedule::draft::{ScheduleDraft, ValidationMode};

/// Who is acting, and the store they act on.
///
/// Passed into the manager explicitly; nothing here is global.
pub struct Session<'a> {
    pub user: String,
    store: &'a dyn ScheduleStore,
}

impl<'a> Session<'a> {
    pub fn new(user: impl Into<String>, store: &'a dyn ScheduleStore) -> Self {
        Self {
            user: user.into(),
            store,
        }
    }

    pub fn store(&self) -> &'a dyn ScheduleStore {
        self.store
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Viewing,
    Editing,
    Saving,
}

impl ManagerState {
    fn describe(&self) -> &'static str {
        match self {
            ManagerState::Viewing => "viewing",
            ManagerState::Editing => "editing",
            ManagerState::Saving => "saving",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
}

/// Identifies one date fetch. Only the most recently issued ticket may
/// change what the manager shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    pub date: NaiveDate,
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Edit lifecycle for one mosque's schedule on a selected date.
pub struct ScheduleManager<'a> {
    session: Session<'a>,
    mosque_id: String,
    date: NaiveDate,
    current: Option<DailySchedule>,
    draft: Option<ScheduleDraft>,
    state: ManagerState,
    validation: ValidationMode,
    fetch_seq: u64,
}

impl<'a> ScheduleManager<'a> {
    pub fn new(
        session: Session<'a>,
        mosque_id: impl Into<String>,
        date: NaiveDate,
        validation: ValidationMode,
    ) -> Self {
        Self {
            session,
            mosque_id: mosque_id.into(),
            date,
            current: None,
            draft: None,
            state: ManagerState::Viewing,
            validation,
            fetch_seq: 0,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The stored schedule for the selected date, if one was found.
    pub fn current(&self) -> Option<&DailySchedule> {
        self.current.as_ref()
    }

    pub fn draft(&self) -> Option<&ScheduleDraft> {
        self.draft.as_ref()
    }

    /// Draft fields, writable only while editing.
    pub fn draft_mut(&mut self) -> Option<&mut ScheduleDraft> {
        match self.state {
            ManagerState::Editing => self.draft.as_mut(),
            _ => None,
        }
    }

    fn require(&self, allowed: &[ManagerState], action: &'static str) -> Result<(), ManagerError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ManagerError::InvalidState {
                action,
                state: self.state.describe(),
            })
        }
    }

    /// Start loading `date`. The previous selection stops being current
    /// immediately, and any outstanding ticket goes stale.
    pub fn request_date(&mut self, date: NaiveDate) -> Result<FetchTicket, ManagerError> {
        self.require(&[ManagerState::Viewing, ManagerState::Editing], "select a date")?;
        self.fetch_seq += 1;
        self.date = date;
        self.current = None;
        self.draft = None;
        self.state = ManagerState::Viewing;
        Ok(FetchTicket {
            seq: self.fetch_seq,
            date,
        })
    }

    pub fn fetch(&self, ticket: &FetchTicket) -> Result<Vec<DailySchedule>, StoreError> {
        self.session
            .store()
            .find_by_mosque_and_date(&self.mosque_id, Some(&iso(ticket.date)))
    }

    /// Apply the response for `ticket`. Returns `Ok(false)` and changes
    /// nothing when a newer request has been issued since.
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<DailySchedule>, StoreError>,
    ) -> Result<bool, ManagerError> {
        if ticket.seq != self.fetch_seq {
            log::debug!(
                "dropping stale fetch #{} for {} (latest #{})",
                ticket.seq,
                ticket.date,
                self.fetch_seq
            );
            return Ok(false);
        }
        match result {
            Ok(rows) => {
                self.current = rows.into_iter().next();
                Ok(true)
            }
            Err(e) => {
                log::warn!(
                    "failed to load prayer times for {} on {}: {}",
                    self.mosque_id,
                    ticket.date,
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Load the schedule for `date` and show it.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), ManagerError> {
        let ticket = self.request_date(date)?;
        let result = self.fetch(&ticket);
        self.apply_fetch(ticket, result).map(|_| ())
    }

    pub fn refresh(&mut self) -> Result<(), ManagerError> {
        self.select_date(self.date)
    }

    /// Open a draft holding the displayed schedule, or a blank one.
    pub fn begin_edit(&mut self) -> Result<(), ManagerError> {
        self.require(&[ManagerState::Viewing], "start editing")?;
        self.draft = Some(match &self.current {
            Some(schedule) => ScheduleDraft::from_schedule(schedule),
            None => ScheduleDraft::blank(),
        });
        self.state = ManagerState::Editing;
        Ok(())
    }

    /// Seed the draft from the previous calendar day's schedule.
    ///
    /// Only offered when the selected date has no schedule. From `Viewing`
    /// this opens the draft; from `Editing` it overwrites the draft fields.
    /// When the previous day has nothing stored the draft is left untouched.
    pub fn copy_from_previous_day(&mut self) -> Result<(), ManagerError> {
        self.require(
            &[ManagerState::Viewing, ManagerState::Editing],
            "copy from the previous day",
        )?;
        if self.current.is_some() {
            return Err(ManagerError::ScheduleExists);
        }
        let previous = self
            .date
            .pred_opt()
            .ok_or_else(|| ManagerError::PreviousDayMissing(iso(self.date)))?;
        let previous_iso = iso(previous);

        let rows = self
            .session
            .store()
            .find_by_mosque_and_date(&self.mosque_id, Some(&previous_iso))
            .inspect_err(|e| log::warn!("failed to copy prayer times: {}", e))?;
        let Some(source) = rows.first() else {
            return Err(ManagerError::PreviousDayMissing(previous_iso));
        };

        self.draft = Some(ScheduleDraft::from_schedule(source));
        self.state = ManagerState::Editing;
        log::info!(
            "{} copied prayer times for {} from {}",
            self.session.user,
            self.date,
            previous_iso
        );
        Ok(())
    }

    /// Write the draft: update when the selected date already had a schedule,
    /// insert otherwise. On failure the draft is kept and editing resumes.
    pub fn save(&mut self) -> Result<SaveOutcome, ManagerError> {
        self.require(&[ManagerState::Editing], "save")?;
        let Some(draft) = self.draft.as_ref() else {
            return Err(ManagerError::InvalidState {
                action: "save",
                state: "editing without a draft",
            });
        };
        draft.validate(self.validation)?;

        let schedule = draft.to_schedule(&self.mosque_id, &iso(self.date));
        self.state = ManagerState::Saving;
        let (outcome, result) = if self.current.is_some() {
            (SaveOutcome::Updated, self.session.store().update(&schedule))
        } else {
            (SaveOutcome::Inserted, self.session.store().insert(&schedule))
        };

        if let Err(e) = result {
            log::warn!("failed to save prayer times for {}: {}", schedule.date, e);
            self.state = ManagerState::Editing;
            return Err(e.into());
        }

        log::info!(
            "{} saved prayer times for {} on {} ({:?})",
            self.session.user,
            self.mosque_id,
            schedule.date,
            outcome
        );
        self.state = ManagerState::Viewing;
        self.draft = None;
        if let Err(e) = self.refresh() {
            // The write went through; keep showing what was written.
            log::warn!("reload after save failed: {}", e);
            self.current = Some(schedule);
        }
        Ok(outcome)
    }

    pub fn cancel_edit(&mut self) -> Result<(), ManagerError> {
        self.require(&[ManagerState::Editing], "cancel editing")?;
        self.draft = None;
        self.state = ManagerState::Viewing;
        Ok(())
    }

    /// Remove the displayed schedule.
    pub fn delete_current(&mut self) -> Result<(), ManagerError> {
        self.require(&[ManagerState::Viewing], "delete")?;
        let date = iso(self.date);
        self.session
            .store()
            .delete(&self.mosque_id, &date)
            .inspect_err(|e| log::warn!("failed to delete prayer times for {}: {}", date, e))?;
        log::info!("{} deleted prayer times for {} on {}", self.session.user, self.mosque_id, date);
        self.current = None;
        Ok(())
    }
}
