use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use smartbin_core::service::UserAction;

use crate::app::{App, DetailView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Dispatched to the dashboard in the background
    Backend(UserAction),
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Down, Enter, Esc, Tab, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if !key.modifiers.is_empty() && key.modifiers != KeyModifiers::SHIFT {
        return Action::None;
    }

    match key.code {
        Char('q') => Action::Quit,
        Up | Char('k') => {
            app.move_up();
            Action::None
        }
        Down | Char('j') => {
            app.move_down();
            Action::None
        }
        Enter | Char(' ') => {
            app.select_highlighted();
            Action::None
        }
        Esc => {
            app.dashboard.select_bin(None);
            Action::None
        }
        Tab => {
            app.detail = next_view(app.detail);
            Action::None
        }
        Char('r') => Action::Backend(UserAction::Refresh),
        Char('o') => {
            app.detail = DetailView::Route;
            Action::Backend(UserAction::OptimizeRoute)
        }
        Char('c') => {
            app.dashboard.clear_route();
            Action::None
        }
        Char('n') => {
            app.detail = DetailView::Navigation;
            Action::Backend(UserAction::NavigateToSelected)
        }
        Char('s') => {
            app.dashboard.stop_navigation();
            Action::None
        }
        Char('p') => {
            app.detail = DetailView::Prediction;
            Action::Backend(UserAction::PredictSelected)
        }
        Char('a') => {
            app.detail = DetailView::Alerts;
            Action::Backend(UserAction::LoadAlerts)
        }
        Char('x') => {
            app.dashboard.notifications_mut().dismiss_latest();
            Action::None
        }
        _ => Action::None,
    }
}

fn next_view(view: DetailView) -> DetailView {
    match view {
        DetailView::Bin => DetailView::Route,
        DetailView::Route => DetailView::Prediction,
        DetailView::Prediction => DetailView::Navigation,
        DetailView::Navigation => DetailView::Alerts,
        DetailView::Alerts => DetailView::Bin,
    }
}
