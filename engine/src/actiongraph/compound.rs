//! Groups primitive actions into the compound actions a caller presents to
//! a user: "Create partition /dev/sda1 (16 GiB) and mount on /boot" instead
//! of three separate lines. Grouping is purely a presentation concern — it
//! never changes execution order, only which actions share a `sentence()`.

use petgraph::graph::NodeIndex;

use devgraph::{DeviceGraph, Sid};

use super::{Action, ActionGraph, ActionKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundAction {
    pub target: Sid,
    pub actions: Vec<NodeIndex>,
    pub is_delete: bool,
}

impl CompoundAction {
    /// A short, localisable description of what this compound action does.
    /// Real localisation is out of scope; this renders the same English
    /// template the reference tool used to.
    pub fn sentence(&self, graph: &DeviceGraph, action_graph: &ActionGraph) -> String {
        let name = graph
            .find_by_sid(self.target)
            .map(|d| d.displayname())
            .unwrap_or_else(|| format!("sid {}", self.target));

        if self.is_delete {
            return format!("Delete {name}");
        }

        let mut verbs = Vec::new();
        for &idx in &self.actions {
            match &action_graph.action(idx).kind {
                ActionKind::Create => verbs.push(format!("Create {name}")),
                ActionKind::Modify => verbs.push(format!("Modify {name}")),
                ActionKind::Resize => verbs.push(format!("Resize {name}")),
                ActionKind::Reallot(_) => verbs.push(format!("Change membership of {name}")),
                ActionKind::Activate => verbs.push(format!("Activate {name}")),
                ActionKind::Deactivate => verbs.push(format!("Deactivate {name}")),
                ActionKind::SetPartitionId(id) => verbs.push(format!("Set id of {name} to {id}")),
                ActionKind::SetBoot(_) => verbs.push(format!("Set boot flag on {name}")),
                ActionKind::SetLegacyBoot(_) => verbs.push(format!("Set legacy boot flag on {name}")),
                ActionKind::AddEtcMdadm => verbs.push(format!("Add {name} to mdadm.conf")),
                ActionKind::Rename(to) => verbs.push(format!("Rename {name} to {to}")),
                ActionKind::TmpMount(path) => verbs.push(format!("Mount {name} on {path}")),
                ActionKind::TmpUnmount => verbs.push(format!("Unmount {name}")),
                ActionKind::Delete => {}
            }
        }
        verbs.join(" and ")
    }
}

fn is_delete_kind(kind: &ActionKind) -> bool {
    matches!(kind, ActionKind::Delete)
}

/// Clusters every action by its target device. A caller can then locate the
/// `CompoundAction` for a given target with a linear scan (or a map keyed
/// by `target`, built by the caller if needed).
pub fn group(action_graph: &ActionGraph, all_nodes: &[NodeIndex]) -> Vec<CompoundAction> {
    let mut groups: Vec<CompoundAction> = Vec::new();

    for &idx in all_nodes {
        let action: &Action = action_graph.action(idx);
        if let Some(group) = groups.iter_mut().find(|g| g.target == action.target) {
            group.actions.push(idx);
            group.is_delete = group.is_delete || is_delete_kind(&action.kind);
        } else {
            groups.push(CompoundAction {
                target: action.target,
                actions: vec![idx],
                is_delete: is_delete_kind(&action.kind),
            });
        }
    }

    groups
}

/// Finds the compound action whose target is `sid`, if any action touches
/// it.
pub fn find_for_target(groups: &[CompoundAction], sid: Sid) -> Option<&CompoundAction> {
    groups.iter().find(|g| g.target == sid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actiongraph::build;
    use devgraph::device::{BlkDeviceAttrs, Device as D, Disk};
    use devgraph::region::Region;

    #[test]
    fn groups_chain_actions_under_one_target() {
        let lhs = DeviceGraph::new();
        let mut rhs = lhs.copy();
        let sid = rhs.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new(
            "/dev/sda",
            Region::new(0, 100, 512),
        ))));

        let (ag, order) = build(&lhs, &rhs, sysdefs::TargetMode::Image).unwrap();
        let groups = group(&ag, &order);

        assert_eq!(groups.len(), 1);
        let found = find_for_target(&groups, sid).unwrap();
        assert!(!found.is_delete);
        assert_eq!(found.sentence(&rhs, &ag), "Create /dev/sda");
    }
}
