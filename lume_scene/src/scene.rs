// Copyright 2025 the Lume Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene and its task queue.
//!
//! All properties belong to the thread that owns the [`Scene`]. Other
//! threads reach them by posting tasks through a [`TaskSender`]; the owner
//! runs them in [`Scene::process_tasks`].

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use lume_meta::{MetaError, ObjectExt, ObjectPtr, ObjectRef};
use parking_lot::Mutex;

use crate::ecs::{EcsObject, World};
use crate::effects::{EffectClasses, effect_classes};
use crate::node::{Node, camera_component, node_components};
use crate::postprocess::{PostProcess, post_process_component};

/// Work posted to the scene thread.
pub type Task = Box<dyn FnOnce(&Scene) + Send>;

type TaskQueue = Arc<Mutex<VecDeque<Task>>>;

/// Posts tasks to a scene from any thread.
#[derive(Clone)]
pub struct TaskSender {
    queue: TaskQueue,
}

impl TaskSender {
    /// Queues `task` for the next [`Scene::process_tasks`].
    pub fn post(&self, task: impl FnOnce(&Scene) + Send + 'static) {
        self.queue.lock().push_back(Box::new(task));
    }

    /// Returns the number of queued tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl fmt::Debug for TaskSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSender")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// A scene: the entity world, the effect classes and the task queue.
///
/// # Example
///
/// ```rust
/// use lume_scene::Scene;
///
/// let scene = Scene::new().unwrap();
/// let sender = scene.task_sender();
/// let handle = std::thread::spawn(move || {
///     sender.post(|scene| {
///         scene.create_node("from another thread").unwrap();
///     });
/// });
/// handle.join().unwrap();
///
/// assert_eq!(scene.world().entity_count(), 0);
/// assert_eq!(scene.process_tasks(), 1);
/// assert_eq!(scene.world().entity_count(), 1);
/// ```
pub struct Scene {
    world: Rc<World>,
    classes: Rc<EffectClasses>,
    tasks: TaskQueue,
    processing: Cell<bool>,
}

impl Scene {
    /// Creates an empty scene.
    ///
    /// Fails only if the effect classes cannot be registered.
    pub fn new() -> Result<Self, MetaError> {
        let classes = effect_classes().inspect_err(|err| {
            log::error!("registering effect classes: {err}");
        })?;
        Ok(Self {
            world: World::new(),
            classes: Rc::new(classes),
            tasks: Arc::default(),
            processing: Cell::new(false),
        })
    }

    /// Returns the entity world.
    #[must_use]
    pub fn world(&self) -> &Rc<World> {
        &self.world
    }

    /// Returns the effect class registry.
    #[must_use]
    pub fn classes(&self) -> &Rc<EffectClasses> {
        &self.classes
    }

    /// Returns a handle other threads can post tasks through.
    #[must_use]
    pub fn task_sender(&self) -> TaskSender {
        TaskSender {
            queue: self.tasks.clone(),
        }
    }

    /// Runs the tasks queued so far. Returns how many ran.
    ///
    /// Tasks queued while processing run on the next call.
    pub fn process_tasks(&self) -> usize {
        let batch: Vec<Task> = self.tasks.lock().drain(..).collect();
        if batch.is_empty() {
            return 0;
        }
        let was_processing = self.processing.replace(true);
        let count = batch.len();
        for task in batch {
            task(self);
        }
        self.processing.set(was_processing);
        log::debug!("processed {count} scene tasks");
        count
    }

    /// Runs `task` now, or queues it if called from inside a task.
    ///
    /// Returns `true` if the task ran immediately.
    pub fn run_directly_or_in_task(&self, task: impl FnOnce(&Self) + Send + 'static) -> bool {
        if self.processing.get() {
            self.tasks.lock().push_back(Box::new(task));
            return false;
        }
        task(self);
        true
    }

    /// Creates a node entity with its name, transform and sort components.
    pub fn create_node(&self, name: &str) -> Result<Rc<Node>, MetaError> {
        let entity = self.world.create_entity();
        for component in node_components(name) {
            self.world.add_component(entity, component)?;
        }
        Ok(Node::new(EcsObject::new(&self.world, entity)))
    }

    /// Creates a camera with its post-process object on the same entity.
    pub fn create_camera(&self, name: &str) -> Result<Rc<Node>, MetaError> {
        let entity = self.world.create_entity();
        for component in node_components(name) {
            self.world.add_component(entity, component)?;
        }
        self.world.add_component(entity, camera_component())?;
        self.world.add_component(entity, post_process_component())?;

        let ecs = EcsObject::new(&self.world, entity);
        let camera = Node::camera(ecs.clone());
        let post: ObjectPtr = PostProcess::new(self.classes.clone(), Some(ecs));
        camera.set_value("PostProcess", ObjectRef::new(post))?;
        Ok(camera)
    }

    /// Destroys the entity behind `node`.
    pub fn destroy_node(&self, node: &Node) -> bool {
        self.world.destroy_entity(node.ecs().entity())
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("world", &self.world)
            .field("classes", &self.classes.len())
            .field("pending_tasks", &self.tasks.lock().len())
            .finish_non_exhaustive()
    }
}
