use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use jill::config::CanvasConfig;
use jill::glyphs::{Glyphs, TreeGlyphs};
use jill::system::process::{ProcessRecord, ProcessSnapshot};
use jill::system::tree::{COMMAND_KEY, FilterCriteria, filtered_lines};
use jill::ui::canvas::Canvas;
use jill::ui::table::{Table, TableColumn, TableOptions};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use std::hint::black_box;

fn make_records(n: usize) -> Vec<ProcessRecord> {
    (0..n)
        .map(|i| {
            let pid = i as u32 + 1;
            let ppid = if i == 0 { 0 } else { (i as u32 / 2) + 1 };
            ProcessRecord {
                pid,
                ppid: Some(ppid),
                uid: (i % 8) as u32,
                owner: format!("u{}", i % 8),
                state: 'S',
                command: format!("proc_{i} --work"),
                utime: i as u64,
                stime: 0,
                cutime: 0,
                cstime: 0,
                start_time: i as u64,
                vsize: 4096,
                selinux: None,
            }
        })
        .collect()
}

fn bench_snapshot_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_build_500_1000_2000");

    for size in [500usize, 1000, 2000] {
        let records = make_records(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let snapshot = ProcessSnapshot::build(100.0, black_box(records.clone()));
                black_box(snapshot)
            })
        });
    }

    group.finish();
}

fn bench_filtered_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered_lines_500_1000_2000");
    let tree_glyphs = TreeGlyphs::from_glyphs(&Glyphs::utf8());

    for size in [500usize, 1000, 2000] {
        let snapshot = ProcessSnapshot::build(100.0, make_records(size))
            .expect("bench records are fully linked");
        let criteria = FilterCriteria::new().with(COMMAND_KEY, "proc_7");
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| {
                let lines = filtered_lines(black_box(snapshot), black_box(&criteria));
                let text: Vec<String> = lines.iter().map(|l| l.command_text(&tree_glyphs)).collect();
                black_box(text)
            })
        });
    }

    group.finish();
}

fn bench_table_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_render_500_1000_2000");
    let area = Rect::new(0, 0, 160, 50);

    for size in [500usize, 1000, 2000] {
        let mut table = Table::new(
            vec![
                TableColumn::new("PID").max_width(5),
                TableColumn::new("COMMAND").max_width(800),
            ],
            TableOptions {
                show_header: true,
                ..TableOptions::default()
            },
        );
        for (row, record) in make_records(size).iter().enumerate() {
            table.set_value(row, 0, record.pid.to_string());
            table.set_value(row, 1, record.command.as_str());
        }
        table.layout(area.width, area.height);
        table.select(size / 2);

        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| {
                let mut buf = Buffer::empty(area);
                let mut canvas = Canvas::new(&mut buf, CanvasConfig::default());
                table.render(&mut canvas, area, true);
                black_box(buf)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_snapshot_build,
    bench_filtered_lines,
    bench_table_render
);
criterion_main!(benches);
