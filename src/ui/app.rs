use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info, warn};

use crate::cluster::{self, ClusterRef, DeletionQueue, Item, ItemKind};
use crate::error::Result;
use crate::store;

use super::form::Form;
use super::view;

/// Shown in the status panel by the `z` key.
const RESOURCES_COMMAND: &str = "df -h . && free -h";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Deletion,
    Form,
}

/// All UI state. Key handling mutates it, `view::render` draws it.
pub struct App {
    pub root: ClusterRef,
    pub current: ClusterRef,
    pub selected: usize,
    // where the selection sat before descending, restored by `b`
    pub parent_selection: usize,
    pub mode: Mode,
    pub status: String,
    pub queue: DeletionQueue,
    pub form: Form,
    pub last_kind: ItemKind,
    pub show_help: bool,
    pub data_path: PathBuf,
    pub saved_at: Option<DateTime<Local>>,
}

impl App {
    pub fn new(root: ClusterRef, data_path: PathBuf) -> App {
        App {
            current: root.clone(),
            root,
            selected: 0,
            parent_selection: 0,
            mode: Mode::Browse,
            status: "Welcome! 'h' shows the keys.".to_string(),
            queue: DeletionQueue::default(),
            form: Form::default(),
            last_kind: ItemKind::default(),
            show_help: false,
            data_path,
            saved_at: None,
        }
    }

    /// Children of the current cluster, clusters first, in stored order.
    pub fn items(&self) -> Vec<Item> {
        let current = self.current.borrow();
        let mut items: Vec<Item> = current
            .children_clusters
            .iter()
            .cloned()
            .map(Item::Cluster)
            .collect();
        items.extend(current.children_phones.iter().cloned().map(Item::Phone));
        items
    }

    /// Selection clamped to the current list length.
    pub fn selected_index(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.selected.min(len - 1)
        }
    }

    fn selected_item(&self) -> Option<Item> {
        let items = self.items();
        if items.is_empty() {
            None
        } else {
            Some(items[self.selected_index(items.len())].clone())
        }
    }

    fn select_next(&mut self) {
        let len = self.items().len();
        if len > 0 {
            let index = self.selected_index(len);
            if index + 1 < len {
                self.selected = index + 1;
            }
        }
    }

    fn select_prev(&mut self) {
        let index = self.selected_index(self.items().len());
        if index > 0 {
            self.selected = index - 1;
        }
    }

    fn enter_selected(&mut self) {
        if let Some(Item::Cluster(target)) = self.selected_item() {
            self.parent_selection = self.selected_index(self.items().len());
            self.current = target;
            self.selected = 0;
        }
    }

    fn go_back(&mut self) {
        let parent = self.current.borrow().parent.upgrade();
        if let Some(parent) = parent {
            self.current = parent;
            self.selected = self.parent_selection;
        }
    }

    /// Whole-tree write after a structural mutation. A failure keeps the
    /// in-memory change and reports in the status panel, nothing is rolled
    /// back.
    fn persist(&mut self) {
        match store::save(&self.root, &self.data_path) {
            Ok(()) => self.saved_at = Some(Local::now()),
            Err(err) => {
                error!("[UI] Save to {} failed: {}", self.data_path.display(), err);
                self.status = format!("Failed to save {}: {}", self.data_path.display(), err);
            }
        }
    }

    fn open_create_form(&mut self) {
        self.form = Form::create(self.last_kind);
        self.mode = Mode::Form;
    }

    fn open_edit_form(&mut self) {
        if let Some(item) = self.selected_item() {
            self.form = Form::edit(&item);
            self.mode = Mode::Form;
        }
    }

    fn save_form(&mut self) {
        let fields = self.form.to_fields();
        let result = match &self.form.editing {
            Some(item) => cluster::edit_item(item, fields).map(|_| None),
            None => cluster::create_item(&self.current, self.form.kind, fields).map(Some),
        };
        match result {
            Ok(Some(item)) => {
                self.status = format!("Created '{}'", item.name());
                self.last_kind = self.form.kind;
                self.selected = 0;
                self.mode = Mode::Browse;
                self.persist();
            }
            Ok(None) => {
                self.status = format!("Saved '{}'", self.form.name);
                self.mode = Mode::Browse;
                self.persist();
            }
            Err(err) => self.form.message = err.to_string(),
        }
    }

    /// `d` toggles the mark. Deletion mode lasts as long as something is
    /// marked, so marks always resolve against the view they were made in.
    fn mark_selected(&mut self) {
        if let Some(item) = self.selected_item() {
            let kind = if item.is_cluster() { "cluster" } else { "phone" };
            if self.queue.is_marked(&item) {
                self.queue.unmark(&item);
                self.status = format!("Unmarked {} '{}'", kind, item.name());
            } else {
                // read the name before the mark tags it
                let name = item.name();
                self.queue.mark(&item);
                self.status = format!("Marked {} '{}' for deletion", kind, name);
            }
        }
        self.mode = if self.queue.is_empty() {
            Mode::Browse
        } else {
            Mode::Deletion
        };
    }

    fn confirm_deletion(&mut self) {
        let count = self.queue.len();
        self.queue.confirm(&self.current);
        self.mode = Mode::Browse;
        self.selected = 0;
        self.status = format!("Deleted {} item(s)", count);
        self.persist();
    }

    fn cancel_deletion(&mut self) {
        self.queue.cancel();
        self.mode = Mode::Browse;
        self.status = "Deletion cancelled".to_string();
    }

    fn start_selected_job(&mut self) {
        if let Some(Item::Cluster(target)) = self.selected_item() {
            target.borrow_mut().start_job();
            self.status = format!("Started job for cluster '{}'", target.borrow().name);
        } else {
            self.status = "Jobs only run on clusters".to_string();
        }
    }

    fn stop_selected_job(&mut self) {
        if let Some(Item::Cluster(target)) = self.selected_item() {
            target.borrow_mut().stop_job();
            self.status = format!("Stopped job for cluster '{}'", target.borrow().name);
        } else {
            self.status = "Jobs only run on clusters".to_string();
        }
    }

    fn restart_selected_job(&mut self) {
        if let Some(Item::Cluster(target)) = self.selected_item() {
            target.borrow_mut().restart_job();
            self.status = format!("Restarted job for cluster '{}'", target.borrow().name);
        } else {
            self.status = "Jobs only run on clusters".to_string();
        }
    }

    fn preview_selected(&mut self) {
        match self.selected_item() {
            Some(Item::Cluster(target)) => {
                self.status = format!("Cluster view\n{}", target.borrow().preview());
            }
            Some(Item::Phone(_)) => {
                self.status = "Only clusters have a preview".to_string();
            }
            None => {}
        }
    }

    fn show_host_resources(&mut self) {
        self.status = host_resources();
    }

    /// Returns true when the app should quit.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            // resizes redraw on the next pass of the loop
            _ => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.mode {
            Mode::Form => {
                self.handle_form_key(key);
                false
            }
            Mode::Deletion => self.handle_deletion_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Enter => self.enter_selected(),
            KeyCode::Char('b') => self.go_back(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Char('n') => self.open_create_form(),
            KeyCode::Char('e') => self.open_edit_form(),
            KeyCode::Char('d') => self.mark_selected(),
            KeyCode::Char('s') => self.start_selected_job(),
            KeyCode::Char('x') => self.stop_selected_job(),
            KeyCode::Char('r') => self.restart_selected_job(),
            KeyCode::Char('p') => self.preview_selected(),
            KeyCode::Char('z') => self.show_host_resources(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => {}
        }
        false
    }

    fn handle_deletion_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('c') => self.confirm_deletion(),
            KeyCode::Esc => self.cancel_deletion(),
            KeyCode::Char('d') => self.mark_selected(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Char('h') | KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => {}
        }
        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::ALT) && key.code == KeyCode::Char('t') {
            self.form.toggle_kind();
            return;
        }
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => self.save_form(),
            KeyCode::Down | KeyCode::Tab => self.form.focus_next(),
            KeyCode::Up => self.form.focus_prev(),
            KeyCode::Backspace => self.form.pop_char(),
            KeyCode::Char(c) => self.form.push_char(c),
            _ => {}
        }
    }
}

/// Output of the host usage command, or a formatted error. Never fatal.
fn host_resources() -> String {
    let output = Command::new("sh").arg("-c").arg(RESOURCES_COMMAND).output();
    match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).to_string()
        }
        Ok(output) => {
            warn!("[UI] Resources command exited with {}", output.status);
            format!(
                "Error: {}\n{}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )
        }
        Err(err) => {
            warn!("[UI] Resources command failed to spawn: {}", err);
            format!("Error: {}", err)
        }
    }
}

/// Owns the terminal for the whole session. Raw mode and the alternate
/// screen are torn down before returning, also on error.
pub async fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        // stats go stale on every mutation, recompute before drawing
        cluster::compute_stats(&app.root);
        terminal.draw(|frame| view::render(frame, app))?;

        tokio::select! {
            _ = ticker.tick() => {
                cluster::advance_jobs(&app.root);
            }
            maybe_event = events.next() => {
                if let Some(Ok(event)) = maybe_event {
                    if app.handle_event(event) {
                        info!("[UI] Quit requested");
                        return Ok(());
                    }
                }
            }
        }
    }
}
