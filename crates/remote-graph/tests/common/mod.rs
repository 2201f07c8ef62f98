//! Shared fixture graph for the integration suites.
//!
//! A window with a few scalar properties and a view-model behind an untyped
//! `DataContext` child, plus a `UiThread` that owns nothing but runs every
//! job handed to it in order, the way a UI dispatcher would.

#![allow(dead_code)]

use remote_graph::host::{Evaluation, Mutation};
use remote_graph::{
    shared, Action, AnyObject, Child, Constructible, Endpoint, Exposed, Factory, Host, Members,
    Method, ObjectRef, Property, RpcClient, Shared, Wrappers,
};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tempfile::TempDir;

remote_graph::codec_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Visibility as "fixture::Visibility" { Visible, Hidden, Collapsed }
}

pub struct MainWindow {
    pub title: String,
    pub top: f64,
    pub visibility: Visibility,
    pub data_context: Shared<ViewModel>,
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

remote_graph::impl_type_name!(MainWindow => "fixture::MainWindow");

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
    pub value: String,
    pub tuple: (i32, i32),
    pub parsable_value: MyParam,
}

impl ViewModel {
    pub const VALUE: Property<ViewModel, String> = Property::new("Value");
    pub const TUPLE: Property<ViewModel, (i32, i32)> = Property::new("Tuple");
    pub const PARSABLE_VALUE: Property<ViewModel, MyParam> = Property::new("ParsableValue");
    pub const GET_VALUE: Method<ViewModel, (), String> = Method::new("GetValue");
    pub const ADD: Method<ViewModel, (i32, i32), i32> = Method::new("Add");
    pub const ADD_LONG: Method<ViewModel, (i64, i64), i64> = Method::new("Add");
    pub const DIVIDE: Method<ViewModel, (i32, i32), i32> = Method::new("Divide");
    pub const CONCAT: Method<ViewModel, (MyParam, MyParam), String> = Method::new("Concat");
    pub const GET_TUPLE: Method<ViewModel, (), (i32, i32)> = Method::new("GetTuple");
    pub const GET_PARSABLE_VALUE: Method<ViewModel, (), MyParam> = Method::new("GetParsableValue");
}

remote_graph::impl_type_name!(ViewModel => "fixture::ViewModel");

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            value: "test".to_string(),
            tuple: (1, 2),
            parsable_value: MyParam::new("1", "2"),
        }
    }
}

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
            .method(Self::ADD_LONG, |_, (a, b)| a.wrapping_add(b).wrapping_add(1000))
            .method(Self::DIVIDE, |_, (a, b)| a / b)
            .method(Self::CONCAT, |_, (a, b)| format!("{}{}", a.value, b.value))
            .method(Self::GET_TUPLE, |m, ()| m.tuple)
            .method(Self::GET_PARSABLE_VALUE, |m, ()| m.parsable_value.clone())
    }
}

/// Argument type that is both parsable from text and constructible.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MyParam {
    pub value: String,
}

impl MyParam {
    pub const VALUE: Property<MyParam, String> = Property::new("Value");

    pub fn new(first: &str, second: &str) -> Self {
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
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { value: s.to_string() })
    }
}

remote_graph::impl_codec_from_str!(MyParam => "fixture::MyParam");

impl Constructible for MyParam {
    fn factory() -> Factory<Self> {
        Factory::new()
            .constructor(|(): ()| MyParam::default())
            .constructor(|(a, b): (String, String)| MyParam::new(&a, &b))
            .initializer(Self::VALUE, |p, v| p.value = v)
    }
}

pub fn window() -> Shared<MainWindow> {
    shared(MainWindow {
        title: "main".to_string(),
        top: 0.0,
        visibility: Visibility::Visible,
        data_context: shared(ViewModel::default()),
    })
}

/// An endpoint on a free loopback port with its lock inside `dir`.
pub fn endpoint(dir: &TempDir) -> Endpoint {
    Endpoint::new(
        "127.0.0.1:0".parse().expect("loopback address"),
        dir.path().join("host.lock"),
    )
}

/// A host with the fixture types registered and nothing exposed yet.
pub fn host(dir: &TempDir) -> Host {
    let host = Host::new(endpoint(dir)).expect("host");
    host.register_members::<ViewModel>().expect("view-model members");
    host.register_factory::<MyParam>().expect("param factory");
    host
}

/// A host exposing a fresh window as `main`, plus a client bound to it.
pub fn hosted(dir: &TempDir) -> (Host, Shared<MainWindow>, RpcClient<MainWindow>) {
    let host = host(dir);
    let window = window();
    host.expose(&window, "main").expect("expose");
    let client = RpcClient::with_endpoint(&host.endpoint(), "main");
    (host, window, client)
}

type Job = Box<dyn FnOnce() + Send>;

/// A dedicated thread that runs submitted jobs one after another.
pub struct UiThread {
    jobs: mpsc::Sender<Job>,
    id: ThreadId,
}

impl UiThread {
    pub fn spawn() -> Arc<Self> {
        let (jobs, queue) = mpsc::channel::<Job>();
        let (id_tx, id_rx) = mpsc::channel();
        thread::Builder::new()
            .name("fixture-ui".to_string())
            .spawn(move || {
                let _ = id_tx.send(thread::current().id());
                // A panicking job must not take the thread down with it
                for job in queue {
                    let _ = panic::catch_unwind(AssertUnwindSafe(job));
                }
            })
            .expect("spawn ui thread");
        let id = id_rx.recv().expect("ui thread id");
        Arc::new(Self { jobs, id })
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Run `work` on the UI thread and wait for its result.
    pub fn run<R: Send + 'static>(&self, work: impl FnOnce() -> R + Send + 'static) -> R {
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        self.jobs
            .send(Box::new(move || {
                let _ = reply_tx.send(work());
            }))
            .expect("ui thread alive");
        reply_rx.recv().expect("ui job completed")
    }

    pub fn wrappers(self: &Arc<Self>) -> Wrappers {
        let mutate = self.clone();
        let evaluate = self.clone();
        Wrappers::new(
            move |work: Mutation| mutate.run(work),
            move |work: Evaluation| evaluate.run(work),
        )
    }
}
