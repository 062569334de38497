//! Tree navigation over integer paths
//!
//! The host addresses tree nodes with index paths; the first two indices
//! locate the simulation inside the host document. Each node kind declares
//! an ordered list of child slots, either one fixed child or one child per
//! element of a live collection, and a single walker resolves paths and
//! counts children from that layout.

use crate::model::{
    Antennas, BackgroundScene, GeometryOwner, GeometryRef, Group, MaterialSettings, Receiver,
    RenderSettings, SettingsNode, SetupSettings, Simulation, SolverSettings, Transmitter,
};
use crate::property::PropertyGroup;

/// Number of leading path indices that address the simulation itself
pub const HOST_PREFIX: usize = 2;

/// Borrow-free address of a node in the simulation tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Simulation,
    Setup,
    Render,
    Materials,
    BackgroundScene,
    Material(usize),
    Antennas,
    Transmitters,
    Receivers,
    Transmitter(usize),
    Receiver(usize),
    Solver,
    Geometry { owner: GeometryOwner, index: usize },
}

#[derive(Debug, Clone, Copy)]
enum Collection {
    Materials,
    Transmitters,
    Receivers,
    Geometries(GeometryOwner),
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Fixed(NodeRef),
    Each(Collection),
}

impl NodeRef {
    fn layout(self) -> Vec<Slot> {
        use Slot::{Each, Fixed};
        match self {
            NodeRef::Simulation => vec![
                Fixed(NodeRef::Setup),
                Fixed(NodeRef::Render),
                Fixed(NodeRef::Materials),
                Fixed(NodeRef::Antennas),
                Fixed(NodeRef::Solver),
            ],
            NodeRef::Materials => vec![
                Fixed(NodeRef::BackgroundScene),
                Each(Collection::Materials),
            ],
            NodeRef::Material(i) => vec![Each(Collection::Geometries(GeometryOwner::Material(i)))],
            NodeRef::Antennas => vec![Fixed(NodeRef::Transmitters), Fixed(NodeRef::Receivers)],
            NodeRef::Transmitters => vec![Each(Collection::Transmitters)],
            NodeRef::Receivers => vec![Each(Collection::Receivers)],
            NodeRef::Transmitter(i) => {
                vec![Each(Collection::Geometries(GeometryOwner::Transmitter(i)))]
            }
            NodeRef::Receiver(i) => vec![Each(Collection::Geometries(GeometryOwner::Receiver(i)))],
            NodeRef::Setup
            | NodeRef::Render
            | NodeRef::BackgroundScene
            | NodeRef::Solver
            | NodeRef::Geometry { .. } => Vec::new(),
        }
    }
}

impl Collection {
    fn len(self, sim: &Simulation) -> usize {
        match self {
            Collection::Materials => sim.materials.len(),
            Collection::Transmitters => sim.antennas.transmitters.len(),
            Collection::Receivers => sim.antennas.receivers.len(),
            Collection::Geometries(owner) => sim.geometries(owner).map_or(0, |g| g.len()),
        }
    }

    fn nth(self, index: usize) -> NodeRef {
        match self {
            Collection::Materials => NodeRef::Material(index),
            Collection::Transmitters => NodeRef::Transmitter(index),
            Collection::Receivers => NodeRef::Receiver(index),
            Collection::Geometries(owner) => NodeRef::Geometry { owner, index },
        }
    }
}

impl Slot {
    fn arity(self, sim: &Simulation) -> usize {
        match self {
            Slot::Fixed(_) => 1,
            Slot::Each(collection) => collection.len(sim),
        }
    }

    fn nth(self, index: usize) -> NodeRef {
        match self {
            Slot::Fixed(node) => node,
            Slot::Each(collection) => collection.nth(index),
        }
    }
}

fn child(sim: &Simulation, node: NodeRef, mut index: usize) -> Option<NodeRef> {
    for slot in node.layout() {
        let arity = slot.arity(sim);
        if index < arity {
            return Some(slot.nth(index));
        }
        index -= arity;
    }
    None
}

fn fan_out(sim: &Simulation, node: NodeRef) -> usize {
    node.layout().into_iter().map(|slot| slot.arity(sim)).sum()
}

/// Resolve a full host path; `None` for short, malformed or stale paths
pub fn resolve(sim: &Simulation, path: &[usize]) -> Option<NodeRef> {
    if path.len() < HOST_PREFIX {
        return None;
    }
    path[HOST_PREFIX..]
        .iter()
        .try_fold(NodeRef::Simulation, |node, &index| child(sim, node, index))
}

pub fn count_children(sim: &Simulation, path: &[usize]) -> usize {
    resolve(sim, path).map_or(0, |node| fan_out(sim, node))
}

pub fn get_tree_item<'a>(sim: &'a Simulation, path: &[usize]) -> Option<TreeItem<'a>> {
    resolve(sim, path).and_then(|node| TreeItem::lookup(sim, node))
}

/// Mutable access to the settings object at `node`; the simulation node,
/// groups and geometries have no schema of their own
pub fn settings_mut(sim: &mut Simulation, node: NodeRef) -> Option<&mut dyn SettingsNode> {
    let settings: &mut dyn SettingsNode = match node {
        NodeRef::Setup => &mut sim.setup,
        NodeRef::Render => &mut sim.render,
        NodeRef::BackgroundScene => &mut sim.background,
        NodeRef::Material(i) => sim.materials.get_mut(i)?,
        NodeRef::Antennas => &mut sim.antennas,
        NodeRef::Transmitter(i) => sim.antennas.transmitters.get_mut(i)?,
        NodeRef::Receiver(i) => sim.antennas.receivers.get_mut(i)?,
        NodeRef::Solver => &mut sim.solver,
        NodeRef::Simulation
        | NodeRef::Materials
        | NodeRef::Transmitters
        | NodeRef::Receivers
        | NodeRef::Geometry { .. } => return None,
    };
    Some(settings)
}

/// The parent address of `node`, used to show a geometry's owner
pub fn parent(node: NodeRef) -> Option<NodeRef> {
    match node {
        NodeRef::Simulation => None,
        NodeRef::Setup
        | NodeRef::Render
        | NodeRef::Materials
        | NodeRef::Antennas
        | NodeRef::Solver => Some(NodeRef::Simulation),
        NodeRef::BackgroundScene | NodeRef::Material(_) => Some(NodeRef::Materials),
        NodeRef::Transmitters | NodeRef::Receivers => Some(NodeRef::Antennas),
        NodeRef::Transmitter(_) => Some(NodeRef::Transmitters),
        NodeRef::Receiver(_) => Some(NodeRef::Receivers),
        NodeRef::Geometry { owner, .. } => Some(match owner {
            GeometryOwner::Material(i) => NodeRef::Material(i),
            GeometryOwner::Transmitter(i) => NodeRef::Transmitter(i),
            GeometryOwner::Receiver(i) => NodeRef::Receiver(i),
        }),
    }
}

/// A borrowed node of the simulation tree
#[derive(Debug, Clone, Copy)]
pub enum TreeItem<'a> {
    Simulation(&'a Simulation),
    Setup(&'a SetupSettings),
    Render(&'a RenderSettings),
    Materials(&'a Group<MaterialSettings>),
    BackgroundScene(&'a BackgroundScene),
    Material(&'a MaterialSettings),
    Antennas(&'a Antennas),
    Transmitters(&'a Group<Transmitter>),
    Receivers(&'a Group<Receiver>),
    Transmitter(&'a Transmitter),
    Receiver(&'a Receiver),
    Solver(&'a SolverSettings),
    Geometry(&'a GeometryRef),
}

impl<'a> TreeItem<'a> {
    pub fn lookup(sim: &'a Simulation, node: NodeRef) -> Option<Self> {
        Some(match node {
            NodeRef::Simulation => TreeItem::Simulation(sim),
            NodeRef::Setup => TreeItem::Setup(&sim.setup),
            NodeRef::Render => TreeItem::Render(&sim.render),
            NodeRef::Materials => TreeItem::Materials(&sim.materials),
            NodeRef::BackgroundScene => TreeItem::BackgroundScene(&sim.background),
            NodeRef::Material(i) => TreeItem::Material(sim.materials.get(i)?),
            NodeRef::Antennas => TreeItem::Antennas(&sim.antennas),
            NodeRef::Transmitters => TreeItem::Transmitters(&sim.antennas.transmitters),
            NodeRef::Receivers => TreeItem::Receivers(&sim.antennas.receivers),
            NodeRef::Transmitter(i) => TreeItem::Transmitter(sim.antennas.transmitters.get(i)?),
            NodeRef::Receiver(i) => TreeItem::Receiver(sim.antennas.receivers.get(i)?),
            NodeRef::Solver => TreeItem::Solver(&sim.solver),
            NodeRef::Geometry { owner, index } => TreeItem::Geometry(sim.geometries(owner)?.get(index)?),
        })
    }

    /// Text of the tree node
    pub fn description(&self) -> &'a str {
        match *self {
            TreeItem::Simulation(sim) => &sim.description,
            TreeItem::Setup(s) => s.description(),
            TreeItem::Render(s) => s.description(),
            TreeItem::Materials(g) => &g.description,
            TreeItem::BackgroundScene(s) => s.description(),
            TreeItem::Material(m) => m.description(),
            TreeItem::Antennas(a) => a.description(),
            TreeItem::Transmitters(g) => &g.description,
            TreeItem::Receivers(g) => &g.description,
            TreeItem::Transmitter(t) => t.description(),
            TreeItem::Receiver(r) => r.description(),
            TreeItem::Solver(s) => s.description(),
            TreeItem::Geometry(g) => &g.description,
        }
    }

    /// Warning shown on the node, if any
    pub fn status(&self) -> Option<&'a str> {
        match *self {
            TreeItem::Simulation(_) | TreeItem::Geometry(_) => None,
            TreeItem::Setup(s) => s.status().message(),
            TreeItem::Render(s) => s.status().message(),
            TreeItem::Materials(g) => g.status.message(),
            TreeItem::BackgroundScene(s) => s.status().message(),
            TreeItem::Material(m) => m.status().message(),
            TreeItem::Antennas(a) => a.status().message(),
            TreeItem::Transmitters(g) => g.status.message(),
            TreeItem::Receivers(g) => g.status.message(),
            TreeItem::Transmitter(t) => t.status().message(),
            TreeItem::Receiver(r) => r.status().message(),
            TreeItem::Solver(s) => s.status().message(),
        }
    }

    /// Property panel of the node; groups and geometries have none
    pub fn properties(&self) -> Option<PropertyGroup> {
        match *self {
            TreeItem::Simulation(sim) => Some(sim.properties()),
            TreeItem::Setup(s) => Some(s.properties()),
            TreeItem::Render(s) => Some(s.properties()),
            TreeItem::BackgroundScene(s) => Some(s.properties()),
            TreeItem::Material(m) => Some(m.properties()),
            TreeItem::Antennas(a) => Some(a.properties()),
            TreeItem::Transmitter(t) => Some(t.properties()),
            TreeItem::Receiver(r) => Some(r.properties()),
            TreeItem::Solver(s) => Some(s.properties()),
            TreeItem::Materials(_)
            | TreeItem::Transmitters(_)
            | TreeItem::Receivers(_)
            | TreeItem::Geometry(_) => None,
        }
    }
}
