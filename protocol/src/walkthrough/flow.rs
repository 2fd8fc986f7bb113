//! # Tabbed Flow
//!
//! The two-tab selector ("IP Vault" / "IP Vault + TEE") and the actors and
//! hops each tab shows. Drawing is somebody else's problem; this is the
//! model a renderer reads from.

use serde::Serialize;

use crate::license::AccessCondition;
use crate::vault::VaultMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlowNode {
    IpOwner,
    Vault,
    Tee,
    IpBuyer,
}

impl FlowNode {
    pub fn label(&self) -> &'static str {
        match self {
            FlowNode::IpOwner => "IP Owner",
            FlowNode::Vault => "Vault",
            FlowNode::Tee => "TEE",
            FlowNode::IpBuyer => "IP Buyer",
        }
    }
}

/// A hop between two nodes, optionally captioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    pub from: FlowNode,
    pub to: FlowNode,
    pub caption: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabbedFlow {
    mode: VaultMode,
}

impl TabbedFlow {
    pub fn new(mode: VaultMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> VaultMode {
        self.mode
    }

    /// Switch tabs. Returns whether the selection changed.
    pub fn select(&mut self, mode: VaultMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    pub fn nodes(&self) -> Vec<FlowNode> {
        match self.mode {
            VaultMode::Vault => vec![FlowNode::IpOwner, FlowNode::Vault, FlowNode::IpBuyer],
            VaultMode::Tee => vec![
                FlowNode::IpOwner,
                FlowNode::Vault,
                FlowNode::Tee,
                FlowNode::IpBuyer,
            ],
        }
    }

    pub fn edges(&self) -> Vec<FlowEdge> {
        let mut edges = vec![FlowEdge {
            from: FlowNode::IpOwner,
            to: FlowNode::Vault,
            caption: Some("Secure Upload"),
        }];
        match self.mode {
            VaultMode::Vault => edges.push(FlowEdge {
                from: FlowNode::Vault,
                to: FlowNode::IpBuyer,
                caption: Some("Secure Download"),
            }),
            VaultMode::Tee => {
                edges.push(FlowEdge {
                    from: FlowNode::Vault,
                    to: FlowNode::Tee,
                    caption: Some("Secure Download"),
                });
                edges.push(FlowEdge {
                    from: FlowNode::Tee,
                    to: FlowNode::IpBuyer,
                    caption: None,
                });
            }
        }
        edges
    }

    pub fn write_conditions(&self) -> &'static [AccessCondition] {
        AccessCondition::write_conditions(self.mode)
    }

    pub fn read_conditions(&self) -> &'static [AccessCondition] {
        AccessCondition::read_conditions(self.mode)
    }

    /// One-line textual diagram, e.g.
    /// `IP Owner --[Secure Upload]--> Vault --[Secure Download]--> IP Buyer`.
    pub fn diagram(&self) -> String {
        let mut out = String::from(FlowNode::IpOwner.label());
        for edge in self.edges() {
            match edge.caption {
                Some(caption) => out.push_str(&format!(" --[{caption}]--> ")),
                None => out.push_str(" --> "),
            }
            out.push_str(edge.to.label());
        }
        out
    }
}
