//! Nationality inheritance for travel companions
//!
//! When a family or partner group travels together, companions usually
//! share the lead traveler's nationality. [`NationalityInheritance`] tracks
//! one companion's field and decides when to copy the lead's value in,
//! backing off as soon as the traveler edits the field themselves.

/// Group types whose companions inherit the lead's nationality
const INHERITING_GROUPS: [&str; 2] = ["Family", "Partner"];

/// Inheritance state for one traveler's nationality field
#[derive(Debug, Clone)]
pub struct NationalityInheritance {
    traveler_index: usize,
    group_nature: String,
    is_auto_filled: bool,
    has_manual_override: bool,
    previous_lead: Option<String>,
    last_auto_filled: Option<String>,
}

/// Blank and whitespace-only values count as unset
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl NationalityInheritance {
    pub fn new(traveler_index: usize, group_nature: Option<&str>) -> Self {
        Self {
            traveler_index,
            group_nature: group_nature.unwrap_or_default().trim().to_string(),
            is_auto_filled: false,
            has_manual_override: false,
            previous_lead: None,
            last_auto_filled: None,
        }
    }

    pub fn is_auto_filled(&self) -> bool {
        self.is_auto_filled
    }

    pub fn has_manual_override(&self) -> bool {
        self.has_manual_override
    }

    /// Companion (not the lead) in an inheriting group, with a lead value set
    pub fn can_inherit(&self, lead: Option<&str>) -> bool {
        self.traveler_index > 0
            && INHERITING_GROUPS.contains(&self.group_nature.as_str())
            && present(lead).is_some()
    }

    /// The value this traveler would inherit right now
    pub fn suggested<'a>(&self, lead: Option<&'a str>) -> Option<&'a str> {
        if self.can_inherit(lead) {
            present(lead)
        } else {
            None
        }
    }

    /// Copy the lead's nationality in. Returns the value to write, or `None`
    /// when inheritance does not apply.
    pub fn apply(&mut self, lead: Option<&str>) -> Option<String> {
        let lead = self.suggested(lead)?.to_string();
        self.is_auto_filled = true;
        self.has_manual_override = false;
        self.last_auto_filled = Some(lead.clone());
        Some(lead)
    }

    /// The traveler opted out: stop auto-filling but leave the value as is
    pub fn clear(&mut self) {
        self.is_auto_filled = false;
        self.has_manual_override = true;
    }

    /// React to the current form state. Returns a value to write into this
    /// traveler's nationality field, if one should be written.
    pub fn observe(&mut self, lead: Option<&str>, current: Option<&str>) -> Option<String> {
        let lead = present(lead);
        let current = present(current);
        let mut write = None;

        // The traveler edited a value we filled in.
        if self.is_auto_filled && current.is_some() && current != self.last_auto_filled.as_deref()
        {
            tracing::debug!(
                traveler = self.traveler_index,
                "Nationality edited by hand, stopping inheritance"
            );
            self.has_manual_override = true;
            self.is_auto_filled = false;
        }

        if self.can_inherit(lead)
            && current.is_none()
            && !self.has_manual_override
            && !self.is_auto_filled
        {
            write = self.apply(lead);
        }

        let lead_changed = self.previous_lead.is_some() && self.previous_lead.as_deref() != lead;
        if lead_changed && self.can_inherit(lead) && !self.has_manual_override {
            let changed_by_hand =
                current.is_some() && current != self.last_auto_filled.as_deref();
            if changed_by_hand {
                self.has_manual_override = true;
                self.is_auto_filled = false;
            } else {
                write = self.apply(lead);
            }
        }

        self.previous_lead = lead.map(str::to_string);
        write
    }
}
