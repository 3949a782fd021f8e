use smartbin_core::{model::BinId, service::Dashboard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetailView {
    Bin,
    Route,
    Prediction,
    Navigation,
    Alerts,
}

pub(crate) struct App {
    pub(crate) dashboard: Dashboard,

    pub(crate) bin_list_index: usize,
    pub(crate) detail: DetailView,
}

impl App {
    pub(crate) fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard,
            bin_list_index: 0,
            detail: DetailView::Bin,
        }
    }

    /// Id shown at `bin_list_index` in the priority-ordered list.
    pub(crate) fn highlighted_bin(&self) -> Option<BinId> {
        self.dashboard
            .registry()
            .sorted_by_priority()
            .nth(self.bin_list_index)
            .map(|bin| bin.id.clone())
    }

    pub(crate) fn bin_count(&self) -> usize {
        self.dashboard.registry().bins().len()
    }

    pub(crate) fn move_up(&mut self) {
        self.bin_list_index = self.bin_list_index.saturating_sub(1);
    }

    pub(crate) fn move_down(&mut self) {
        if self.bin_list_index + 1 < self.bin_count() {
            self.bin_list_index += 1;
        }
    }

    /// Keep the cursor inside the list after a refresh shrank it.
    pub(crate) fn clamp_cursor(&mut self) {
        let count = self.bin_count();
        if self.bin_list_index >= count {
            self.bin_list_index = count.saturating_sub(1);
        }
    }

    pub(crate) fn select_highlighted(&mut self) {
        if let Some(id) = self.highlighted_bin() {
            self.dashboard.select_bin(Some(&id));
            self.detail = DetailView::Bin;
        }
    }
}
