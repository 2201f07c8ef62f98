//! Demo object graph served by `rgraph host`.
//!
//! The graph belongs to a dedicated UI thread. Every request is marshalled
//! onto that thread and the dispatcher blocks until it has run, which is the
//! setup a desktop application with a single UI thread would use.

use anyhow::Result;
use remote_graph::host::{Evaluation, Mutation};
use remote_graph::{
    shared, Action, AnyObject, Child, Constructible, Exposed, Factory, Host, Members, Method,
    ObjectRef, Property, Shared, Wrappers,
};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

remote_graph::codec_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Visibility as "demo::Visibility" { Visible, Hidden, Collapsed }
}

pub struct MainWindow {
    title: String,
    top: f64,
    visibility: Visibility,
    data_context: Shared<ViewModel>,
}

impl MainWindow {
    pub const TITLE: Property<MainWindow, String> = Property::new("Title");
    pub const TOP: Property<MainWindow, f64> = Property::new("Top");
    pub const VISIBILITY: Property<MainWindow, Visibility> = Property::new("Visibility");
    pub const IS_VISIBLE: Property<MainWindow, bool> = Property::new("IsVisible");
    pub const DATA_CONTEXT: Child<MainWindow, AnyObject> = Child::new("DataContext");
    pub const HIDE: Action<MainWindow, ()> = Action::new("Hide");
    pub const SHOW: Action<MainWindow, ()> = Action::new("Show");
}

remote_graph::impl_type_name!(MainWindow => "demo::MainWindow");

impl Exposed for MainWindow {
    fn members() -> Members<Self> {
        Members::new()
            .property(Self::TITLE, |w| w.title.clone(), |w, v| w.title = v)
            .property(Self::TOP, |w| w.top, |w, v| w.top = v)
            .property(Self::VISIBILITY, |w| w.visibility, |w, v| w.visibility = v)
            .read_only(Self::IS_VISIBLE, |w| w.visibility == Visibility::Visible)
            .child_object(Self::DATA_CONTEXT, |w| ObjectRef::new(&w.data_context))
            .action(Self::HIDE, |w, ()| w.visibility = Visibility::Hidden)
            .action(Self::SHOW, |w, ()| w.visibility = Visibility::Visible)
    }
}

pub struct ViewModel {
    value: String,
    tuple: (i32, i32),
    parsable_value: MyParam,
}

impl ViewModel {
    pub const VALUE: Property<ViewModel, String> = Property::new("Value");
    pub const TUPLE: Property<ViewModel, (i32, i32)> = Property::new("Tuple");
    pub const PARSABLE_VALUE: Property<ViewModel, MyParam> = Property::new("ParsableValue");
    pub const GET_VALUE: Method<ViewModel, (), String> = Method::new("GetValue");
    pub const ADD: Method<ViewModel, (i32, i32), i32> = Method::new("Add");
    pub const CONCAT: Method<ViewModel, (MyParam, MyParam), String> = Method::new("Concat");
    pub const GET_TUPLE: Method<ViewModel, (), (i32, i32)> = Method::new("GetTuple");
    pub const GET_PARSABLE_VALUE: Method<ViewModel, (), MyParam> = Method::new("GetParsableValue");
}

remote_graph::impl_type_name!(ViewModel => "demo::ViewModel");

impl Exposed for ViewModel {
    fn members() -> Members<Self> {
        Members::new()
            .property(Self::VALUE, |m| m.value.clone(), |m, v| m.value = v)
            .property(Self::TUPLE, |m| m.tuple, |m, v| m.tuple = v)
            .property(
                Self::PARSABLE_VALUE,
                |m| m.parsable_value.clone(),
                |m, v| m.parsable_value = v,
            )
            .method(Self::GET_VALUE, |m, ()| m.value.clone())
            .method(Self::ADD, |_, (a, b)| a.wrapping_add(b))
            .method(Self::CONCAT, |_, (a, b)| format!("{}{}", a.value, b.value))
            .method(Self::GET_TUPLE, |m, ()| m.tuple)
            .method(Self::GET_PARSABLE_VALUE, |m, ()| m.parsable_value.clone())
    }
}

/// Parses from and renders to its `value`; also built by constructor nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MyParam {
    value: String,
}

impl MyParam {
    pub const VALUE: Property<MyParam, String> = Property::new("Value");

    fn joined(first: &str, second: &str) -> Self {
        Self {
            value: format!("{}{}", first, second),
        }
    }
}

impl fmt::Display for MyParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for MyParam {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self { value: s.to_string() })
    }
}

remote_graph::impl_codec_from_str!(MyParam => "demo::MyParam");

impl Constructible for MyParam {
    fn factory() -> Factory<Self> {
        Factory::new()
            .constructor(|(): ()| MyParam::default())
            .constructor(|(a, b): (String, String)| MyParam::joined(&a, &b))
            .initializer(Self::VALUE, |p, v| p.value = v)
    }
}

pub fn main_window() -> Shared<MainWindow> {
    shared(MainWindow {
        title: "remote-graph demo".to_string(),
        top: 100.0,
        visibility: Visibility::Visible,
        data_context: shared(ViewModel {
            value: "test".to_string(),
            tuple: (1, 2),
            parsable_value: MyParam::joined("1", "2"),
        }),
    })
}

/// Register what the host cannot discover from `MainWindow` alone: the
/// view-model behind the untyped `DataContext` and the constructible argument.
pub fn register(host: &Host) -> Result<()> {
    host.register_members::<ViewModel>()?;
    host.register_factory::<MyParam>()?;
    Ok(())
}

type Job = Box<dyn FnOnce() + Send>;

/// Owns the demo graph's thread and runs submitted jobs on it in order.
pub struct UiThread {
    jobs: mpsc::Sender<Job>,
}

impl UiThread {
    pub fn spawn() -> Result<Arc<Self>> {
        let (jobs, queue) = mpsc::channel::<Job>();
        thread::Builder::new().name("ui".to_string()).spawn(move || {
            for job in queue {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("UI job panicked");
                }
            }
            debug!("UI thread exiting");
        })?;
        Ok(Arc::new(Self { jobs }))
    }

    /// Run `work` on the UI thread and wait for it. `None` if the thread is
    /// gone or the job panicked.
    fn run<R: Send + 'static>(&self, work: impl FnOnce() -> R + Send + 'static) -> Option<R> {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || {
            let _ = reply_tx.send(work());
        });
        if self.jobs.send(job).is_err() {
            error!("UI thread is not running");
            return None;
        }
        reply_rx.recv().ok()
    }

    pub fn wrappers(self: &Arc<Self>) -> Wrappers {
        let mutate = self.clone();
        let evaluate = self.clone();
        Wrappers::new(
            move |work: Mutation| {
                mutate.run(work);
            },
            // A unit box is rejected by the host as a missing result
            move |work: Evaluation| {
                evaluate
                    .run(work)
                    .unwrap_or_else(|| Box::new(()) as Box<dyn Any + Send>)
            },
        )
    }
}
