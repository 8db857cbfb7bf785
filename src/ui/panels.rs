//! The dashboard's panels: which rows each table shows and how they are
//! refreshed from the sampled model.

use chrono::{DateTime, Local};
use crossterm::event::KeyEvent;
use ratatui::layout::{Position, Rect};

use super::canvas::Canvas;
use super::filter_table::FilterTable;
use super::table::{Table, TableColumn, TableOptions};
use crate::format::{format_bytes, format_memory_str, format_uptime, partition};
use crate::glyphs::{Glyphs, TreeGlyphs};
use crate::system::Collector;
use crate::system::delta::Delta;
use crate::system::memory::rw_mapped_bytes;
use crate::system::process::{ROOT_PID, state_description};
use crate::system::security::{SelinuxContext, read_apparmor_label};
use crate::system::tree::{COMMAND_KEY, OWNER_KEY, PID_KEY, filtered_lines};

const NOT_AVAILABLE: &str = "n/a";

const PROCESS_PID_COL: usize = 1;
const PROCESS_PPID_COL: usize = 2;
const PROCESS_ROW_LIMIT: u16 = 4;
const THERMAL_ROW_LIMIT: u16 = 4;
const DETAILS_ROW_LIMIT: u16 = 5;
const DETAILS_COMMAND_WIDTH: u16 = 5;

/// State shared between panels within one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewModel {
    /// Pid on the selected process row, `None` for the root or no selection.
    pub selected_pid: Option<u32>,
}

/// Everything a panel may read while refreshing.
pub struct PanelContext<'a> {
    pub collector: &'a Collector,
    pub delta: Delta<'a>,
    pub glyphs: &'a Glyphs,
    pub tree_glyphs: &'a TreeGlyphs,
    pub now: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelKind {
    Selinux,
    AppArmor,
    Cpu { core_columns: usize },
    Memory,
    /// Index into the collector's batteries.
    Battery(usize),
    Thermal,
    Processes,
    ProcessDetails,
}

#[derive(Debug, Clone)]
pub enum Widget {
    Table(Table),
    Filter(FilterTable),
}

#[derive(Debug, Clone)]
pub struct Panel {
    kind: PanelKind,
    title: String,
    widget: Widget,
    focusable: bool,
    stretch_y: bool,
}

impl Panel {
    pub fn new(kind: PanelKind, title: impl Into<String>) -> Self {
        let plain = TableOptions::default();
        let (widget, stretch_y) = match kind {
            PanelKind::Thermal => (
                Widget::Table(Table::new(
                    Vec::new(),
                    TableOptions {
                        row_limit: Some(THERMAL_ROW_LIMIT),
                        ..plain
                    },
                )),
                false,
            ),
            PanelKind::ProcessDetails => (
                Widget::Table(Table::new(
                    Vec::new(),
                    TableOptions {
                        row_limit: Some(DETAILS_ROW_LIMIT),
                        ..plain
                    },
                )),
                false,
            ),
            PanelKind::Processes => (Widget::Filter(process_filter_table()), true),
            _ => (Widget::Table(Table::new(Vec::new(), plain)), false),
        };
        let focusable = matches!(kind, PanelKind::Processes);
        Self {
            kind,
            title: title.into(),
            widget,
            focusable,
            stretch_y,
        }
    }

    pub fn kind(&self) -> &PanelKind {
        &self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn stretch_y(&self) -> bool {
        self.stretch_y
    }

    /// Number of focus targets this panel contributes.
    pub fn part_count(&self) -> usize {
        match (&self.widget, self.focusable) {
            (_, false) => 0,
            (Widget::Table(_), true) => 1,
            (Widget::Filter(ft), true) => ft.part_count(),
        }
    }

    pub fn min_size(&self) -> (u16, u16) {
        match &self.widget {
            Widget::Table(t) => (t.min_width(), t.min_height()),
            Widget::Filter(ft) => (ft.min_width(), ft.min_height()),
        }
    }

    pub fn layout(&mut self, width: u16, height: u16) {
        match &mut self.widget {
            Widget::Table(t) => t.layout(width, height),
            Widget::Filter(ft) => ft.layout(width, height),
        }
    }

    pub fn handle_key(&mut self, part: usize, key: KeyEvent) -> bool {
        match &mut self.widget {
            Widget::Table(t) => t.handle_key(key),
            Widget::Filter(ft) => ft.handle_key(part, key),
        }
    }

    pub fn render(&self, canvas: &mut Canvas, area: Rect, focused: Option<usize>) {
        match &self.widget {
            Widget::Table(t) => t.render(canvas, area, focused.is_some()),
            Widget::Filter(ft) => ft.render(canvas, area, focused),
        }
    }

    pub fn cursor(&self, area: Rect, part: usize) -> Option<Position> {
        match &self.widget {
            Widget::Table(_) => None,
            Widget::Filter(ft) => ft.cursor(area, part),
        }
    }

    pub fn update_from_model(&mut self, ctx: &PanelContext, view: &mut ViewModel) {
        let kind = self.kind.clone();
        match (&kind, &mut self.widget) {
            (PanelKind::Selinux, Widget::Table(t)) => update_selinux(t, ctx),
            (PanelKind::AppArmor, Widget::Table(t)) => update_apparmor(t, ctx),
            (PanelKind::Cpu { core_columns }, Widget::Table(t)) => {
                update_cpu(t, ctx, *core_columns)
            }
            (PanelKind::Memory, Widget::Table(t)) => update_memory(t, ctx),
            (PanelKind::Battery(index), Widget::Table(t)) => update_battery(t, ctx, *index),
            (PanelKind::Thermal, Widget::Table(t)) => update_thermal(t, ctx),
            (PanelKind::Processes, Widget::Filter(ft)) => update_processes(ft, ctx, view),
            (PanelKind::ProcessDetails, Widget::Table(t)) => update_details(t, ctx, view),
            _ => {}
        }
    }
}

fn process_filter_table() -> FilterTable {
    FilterTable::new(
        vec![
            TableColumn::new(OWNER_KEY).min_width(3).max_width(8),
            TableColumn::new(PID_KEY).min_width(3).max_width(5),
            TableColumn::new("PPID").max_width(5).hidden(),
            TableColumn::new("CPU").min_width(4).max_width(4),
            TableColumn::new(COMMAND_KEY).min_width(7).max_width(800),
        ],
        TableOptions {
            row_limit: Some(PROCESS_ROW_LIMIT),
            show_header: true,
            always_highlight: true,
        },
    )
}

/// The top row of panels: which ones exist depends on the machine.
pub fn top_panels(collector: &Collector) -> Vec<Panel> {
    let selinux = collector.selinux().enabled();
    let thermal = !collector.thermal().is_empty();
    let batteries = collector.batteries();
    let boxes = 2 + batteries.len() + usize::from(thermal) + usize::from(selinux);
    let core_columns = if boxes >= 4 { 4 } else { 8 };

    let mut panels = Vec::new();
    if selinux {
        panels.push(Panel::new(PanelKind::Selinux, "SELinux"));
    }
    if collector.apparmor().is_some() {
        panels.push(Panel::new(PanelKind::AppArmor, "AppArmor"));
    }
    panels.push(Panel::new(PanelKind::Cpu { core_columns }, "CPU"));
    panels.push(Panel::new(PanelKind::Memory, "Memory"));
    for (index, battery) in batteries.iter().enumerate() {
        panels.push(Panel::new(PanelKind::Battery(index), battery.name.clone()));
    }
    if thermal {
        let mut panel = Panel::new(PanelKind::Thermal, "Temperature");
        panel.focusable = collector.thermal().len() > THERMAL_ROW_LIMIT as usize;
        panels.push(panel);
    }
    panels
}

fn label_rows(table: &mut Table, rows: &[(&str, String)]) {
    for (row, (label, value)) in rows.iter().enumerate() {
        table.set_value(row, 0, *label);
        table.set_value(row, 1, value.as_str());
    }
}

fn update_selinux(table: &mut Table, ctx: &PanelContext) {
    let status = ctx.collector.selinux();
    table.clear();
    label_rows(
        table,
        &[
            ("Status", status.status.clone()),
            ("Policy", status.policy.clone()),
            ("Mode", status.mode.clone()),
            ("MLS", status.mls.clone()),
        ],
    );
}

fn update_apparmor(table: &mut Table, ctx: &PanelContext) {
    table.clear();
    let Some(status) = ctx.collector.apparmor() else {
        return;
    };
    let enabled = match status.enabled {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "?",
    };
    let mut rows = vec![
        ("Enabled", enabled.to_string()),
        ("Mode", status.mode.clone().unwrap_or_else(|| "?".to_string())),
    ];
    if status.counts_known() {
        rows.push(("Enforce", format!("{} modules", status.enforce)));
        rows.push(("Complain", format!("{} modules", status.complain)));
    }
    label_rows(table, &rows);
}

fn update_cpu(table: &mut Table, ctx: &PanelContext, core_columns: usize) {
    table.clear();
    label_rows(
        table,
        &[
            ("Uptime", format_uptime(ctx.collector.current().uptime())),
            ("Total", format!("{}%", ctx.delta.cpu_total() as i64)),
        ],
    );
    table.set_value(2, 0, "Per Core");
    let cores: Vec<String> = ctx
        .delta
        .cpu_cores()
        .iter()
        .map(|pct| format!("{}%", *pct as i64))
        .collect();
    for (offset, line) in partition(&cores, core_columns).iter().enumerate() {
        table.set_value(2 + offset, 1, line.join(" "));
    }
}

fn update_memory(table: &mut Table, ctx: &PanelContext) {
    let memory = ctx.collector.memory();
    table.clear();
    label_rows(
        table,
        &[
            ("Total", format_memory_str(memory.get("MemTotal"))),
            ("Free", format_memory_str(memory.get("MemFree"))),
            ("Avail", format_memory_str(memory.get("MemAvailable"))),
        ],
    );
}

fn update_battery(table: &mut Table, ctx: &PanelContext, index: usize) {
    table.clear();
    let Some(battery) = ctx.collector.batteries().get(index) else {
        return;
    };
    let (status, charge) = match battery.history.latest() {
        Some(sample) => (sample.status.clone(), format!("{}%", sample.capacity)),
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };
    let mut rows = vec![("Status", status), ("Charge", charge)];
    let remaining = battery.history.time_remaining_text();
    if !remaining.is_empty() {
        rows.push(("Time left", remaining));
    }
    label_rows(table, &rows);
}

fn update_thermal(table: &mut Table, ctx: &PanelContext) {
    table.clear();
    for (row, zone) in ctx.collector.thermal().iter().enumerate() {
        table.set_value(row, 0, zone.kind.as_str());
        table.set_value(row, 1, zone.display(ctx.glyphs.degree));
    }
}

fn update_processes(ft: &mut FilterTable, ctx: &PanelContext, view: &mut ViewModel) {
    let path = ft.table().selection_path(PROCESS_PID_COL, PROCESS_PPID_COL);
    let criteria = ft.search_values();
    let snapshot = &ctx.collector.current().processes;
    let lines = filtered_lines(snapshot, &criteria);

    let table = ft.table_mut();
    table.clear();
    for (row, line) in lines.iter().enumerate() {
        let record = line.record;
        let ppid = record.ppid.map(|p| p.to_string()).unwrap_or_default();
        let cpu = format!("{}%", ctx.delta.process_cpu(record.pid) as i64);
        table.set_value(row, 0, record.owner.as_str());
        table.set_value(row, PROCESS_PID_COL, record.pid.to_string());
        table.set_value(row, PROCESS_PPID_COL, ppid);
        table.set_value(row, 3, format!("{cpu:>4}"));
        table.set_value(row, 4, line.command_text(ctx.tree_glyphs));
    }
    table.restore_selection(&path, PROCESS_PID_COL);

    view.selected_pid = table
        .value(table.selected(), PROCESS_PID_COL)
        .and_then(|pid| pid.parse().ok())
        .filter(|pid| *pid != ROOT_PID);
}

fn update_details(table: &mut Table, ctx: &PanelContext, view: &ViewModel) {
    let command_width = table
        .column_width(1)
        .unwrap_or(DETAILS_COMMAND_WIDTH) as usize;
    table.clear();

    let collector = ctx.collector;
    let record = view
        .selected_pid
        .and_then(|pid| collector.current().processes.get(pid));
    let Some(record) = record else {
        table.set_value(0, 0, NOT_AVAILABLE);
        return;
    };
    let pid = record.pid;
    let uptime = collector.current().uptime();
    let tps = ctx.delta.ticks_per_second;
    let times = ctx.delta.process_times(pid).unwrap_or_default();
    let state = state_description(record.state).unwrap_or("?");
    let started = record.started_at(ctx.now, uptime, tps).format("%H:%M:%S");

    let rows: [(&str, String, &str, String); 4] = [
        (
            "Command",
            record.command.chars().take(command_width).collect(),
            "CPU",
            format!("{}% / {state}", ctx.delta.process_cpu(pid) as i64),
        ),
        (
            "PID/PPID",
            format!("{pid}/{}", record.ppid.unwrap_or(ROOT_PID)),
            "Running Time",
            format!(
                "{} (started {started})",
                format_uptime(record.running_seconds(uptime, tps))
            ),
        ),
        (
            "U/S TIME",
            format!("{}/{}", times.utime, times.stime),
            "CU/CS TIME",
            format!("{}/{}", times.cutime, times.cstime),
        ),
        (
            "Mem Net",
            format_bytes(rw_mapped_bytes(collector.proc_root(), pid)),
            "Mem Gross",
            format_bytes(record.vsize),
        ),
    ];
    for (row, (left, left_value, right, right_value)) in rows.into_iter().enumerate() {
        table.set_value(row, 0, left);
        table.set_value(row, 1, left_value);
        table.set_value(row, 2, right);
        table.set_value(row, 3, right_value);
    }

    if collector.selinux().enabled() {
        let context = record
            .selinux
            .clone()
            .unwrap_or_else(SelinuxContext::unknown);
        table.set_value(4, 0, "SELinux");
        table.set_value(4, 1, context.identity);
        table.set_value(4, 2, context.level);
        table.set_value(4, 3, context.categories);
    } else if collector.apparmor().is_some() {
        table.set_value(4, 0, "AppArmor");
        table.set_value(4, 1, read_apparmor_label(collector.proc_root(), pid));
    }
}
