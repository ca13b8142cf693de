use std::{collections::HashMap, error::Error, ops::Range, path::PathBuf};

use anyhow::{anyhow, Context};
use clap::Parser;
use plotters::{
    backend::BitMapBackend,
    chart::{ChartBuilder, SeriesLabelPosition},
    drawing::IntoDrawingArea,
    element::{PathElement, Rectangle},
    series::LineSeries,
    style::{Color, RGBAColor, ShapeStyle, BLACK, BLUE, GREEN, RED, WHITE},
};
use wcbench_mr::{
    task::TaskKind,
    trace::{Trace, TraceEvent},
};

/// Draws task timelines of a job from its trace.
#[derive(Parser, Debug)]
struct Args {
    /// Path to trace file.
    #[arg(short, long)]
    trace: PathBuf,

    /// Path to output folder with graphs.
    #[arg(short, long)]
    output: PathBuf,

    /// Start of a time segment for a graph.
    #[arg(long, default_value = None)]
    from: Option<f32>,

    /// End of a time segment for a graph.
    #[arg(long, default_value = None)]
    to: Option<f32>,

    /// Width of a graph in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Height of a graph in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Add graph with the number of fetched map outputs.
    #[arg(long, default_value_t = false)]
    fetches: bool,

    /// Stroke width.
    #[arg(long, default_value_t = 2)]
    stroke_width: u32,

    /// Font size.
    #[arg(long, default_value_t = 25)]
    font_size: u32,
}

type TaskPath = (TaskKind, usize);

#[derive(Copy, Clone)]
enum MetricChange {
    Add { task: TaskPath, value: f32 },
    Remove { task: TaskPath },
    Increment(f32),
    None,
}

/// Step function of a metric over time, thinned to about a thousand points.
fn collect_usage_graph<F>(trace: &Trace, args: &Args, metric: F) -> Vec<(f32, f32)>
where
    F: Fn(&TraceEvent) -> MetricChange,
{
    let mut points = Vec::new();
    let (Some(first), Some(last)) = (trace.events.first(), trace.events.last()) else {
        return points;
    };
    let mut cur_usage = 0.0;
    let from = args.from.unwrap_or(first.time() as f32);
    let to = args.to.unwrap_or(last.time() as f32);
    let time_range = to - from;

    let mut added: HashMap<TaskPath, f32> = HashMap::new();
    for event in trace.events.iter() {
        let time = event.time() as f32;
        if time < from {
            continue;
        }
        if time > to {
            points.push((time, cur_usage));
            break;
        }

        cur_usage += match metric(event) {
            MetricChange::Add { task, value } => {
                added.insert(task, value);
                value
            }
            MetricChange::Remove { task } => -added.remove(&task).unwrap_or(0.),
            MetricChange::Increment(value) => value,
            MetricChange::None => 0.,
        };

        let lasty = points.last().map_or(0.0, |p: &(f32, f32)| p.1);
        points.push((time, lasty));
        while points.len() >= 2 && points[points.len() - 2].0 + time_range / 1000.0 >= time {
            points.pop();
        }
        points.push((time, cur_usage));
    }
    points
}

fn running(kind: TaskKind) -> impl Fn(&TraceEvent) -> MetricChange {
    move |event: &TraceEvent| match event {
        TraceEvent::TaskStarted { kind: k, task_id, .. } if *k == kind => MetricChange::Add {
            task: (kind, *task_id),
            value: 1.,
        },
        TraceEvent::TaskCompleted { kind: k, task_id, .. } if *k == kind => MetricChange::Remove {
            task: (kind, *task_id),
        },
        _ => MetricChange::None,
    }
}

struct Line {
    name: String,
    color: RGBAColor,
    data: Vec<(f32, f32)>,
}

fn time_range(args: &Args, lines: &[Line]) -> Range<f32> {
    let mut range = lines
        .iter()
        .flat_map(|line| line.data.iter())
        .map(|point| point.0)
        .fold(
            Range {
                start: f32::MAX,
                end: 0.0,
            },
            |range, time| Range {
                start: range.start.min(time),
                end: range.end.max(time),
            },
        );
    if range.start > range.end {
        range.start = 0.0;
    }
    if let Some(from) = args.from {
        range.start = from;
    }
    if let Some(to) = args.to {
        range.end = to;
    }
    range
}

/// Draws `lines` into `file_name`, with a vertical mark at `marker` if given.
fn draw_lines(args: &Args, file_name: &str, lines: Vec<Line>, marker: Option<f32>) -> Result<(), Box<dyn Error>> {
    let path = args.output.join(file_name);
    let root = BitMapBackend::new(&path, (args.width, args.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let maxy = lines
        .iter()
        .flat_map(|line| line.data.iter().map(|(_x, y)| *y))
        .fold(1.0f32, f32::max);

    let root = root.margin(20, 20, 20, 20);
    let mut chart = ChartBuilder::on(&root)
        .x_label_area_size(20)
        .y_label_area_size(40)
        .build_cartesian_2d(time_range(args, &lines), 0.0..maxy * 1.05)?;

    chart
        .configure_mesh()
        .x_label_style(("sans-serif", args.font_size, &BLACK))
        .y_label_style(("sans-serif", args.font_size, &BLACK))
        .y_label_formatter(&|x: &f32| (x.round() as usize).to_string())
        .draw()?;

    for line in lines.into_iter() {
        chart
            .draw_series(LineSeries::new(
                line.data,
                ShapeStyle {
                    color: line.color,
                    filled: false,
                    stroke_width: args.stroke_width,
                },
            ))?
            .label(line.name)
            .legend(move |(x, y)| Rectangle::new([(x - 10, y + 2), (x + 10, y - 2)], line.color.filled()));
    }

    if let Some(time) = marker {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(time, 0.0), (time, maxy * 1.05)],
                ShapeStyle {
                    color: RED.mix(0.5),
                    filled: false,
                    stroke_width: args.stroke_width,
                },
            )))?
            .label("First reduce start")
            .legend(|(x, y)| Rectangle::new([(x - 10, y + 2), (x + 10, y - 2)], RED.mix(0.5).filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", args.font_size, &BLACK))
        .margin(20)
        .legend_area_size(25)
        .border_style(BLUE)
        .background_style(BLUE.mix(0.1))
        .draw()?;
    root.present()?;
    Ok(())
}

fn draw_running_tasks(args: &Args, trace: &Trace) -> Result<(), Box<dyn Error>> {
    let lines = vec![
        Line {
            name: "Running map tasks".to_string(),
            color: BLUE.into(),
            data: collect_usage_graph(trace, args, running(TaskKind::Map)),
        },
        Line {
            name: "Running reduce tasks".to_string(),
            color: GREEN.into(),
            data: collect_usage_graph(trace, args, running(TaskKind::Reduce)),
        },
        Line {
            name: "Completed map tasks".to_string(),
            color: BLACK.into(),
            data: collect_usage_graph(trace, args, |event| match event {
                TraceEvent::TaskCompleted {
                    kind: TaskKind::Map, ..
                } => MetricChange::Increment(1.),
                _ => MetricChange::None,
            }),
        },
    ];
    let first_reduce_start = trace.events.iter().find_map(|event| match event {
        TraceEvent::TaskStarted {
            time,
            kind: TaskKind::Reduce,
            ..
        } => Some(*time as f32),
        _ => None,
    });
    draw_lines(args, "tasks.png", lines, first_reduce_start)
}

fn draw_fetches(args: &Args, trace: &Trace) -> Result<(), Box<dyn Error>> {
    let lines = vec![Line {
        name: "Fetched map outputs".to_string(),
        color: BLUE.into(),
        data: collect_usage_graph(trace, args, |event| match event {
            TraceEvent::MapOutputFetched { .. } => MetricChange::Increment(1.),
            _ => MetricChange::None,
        }),
    }];
    draw_lines(args, "fetches.png", lines, None)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let trace: Trace = serde_json::from_str(&std::fs::read_to_string(&args.trace).context("Can't read trace file")?)
        .context("Can't parse trace file as json")?;
    std::fs::create_dir_all(&args.output).context("Can't create output folder")?;

    println!(
        "Job {}: {} map tasks on {} slots, {} reduce tasks on {} slots",
        trace.job_name, trace.map_tasks, trace.map_slots, trace.reduce_tasks, trace.reduce_slots
    );
    draw_running_tasks(&args, &trace).map_err(|e| anyhow!("Can't draw tasks graph: {}", e))?;
    if args.fetches {
        draw_fetches(&args, &trace).map_err(|e| anyhow!("Can't draw fetches graph: {}", e))?;
    }
    Ok(())
}
