//! `storplanctl`: loads a probed devicegraph and a staging devicegraph,
//! plans the transition between them, and (unless `--dry-run`) commits it
//! through a `LoggingExecutor` stand-in.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use devgraph::device::Device;
use devgraph::{DeviceGraph, Sid};
use storplan::actiongraph::compound;
use storplan::resize::ReallotMode;
use storplan::{ActionGraph, ActionKind, LoggingExecutor, SystemExecutor};
use sysdefs::TargetMode;

#[derive(Parser, Debug)]
#[command(name = "storplanctl", about = "Plan and apply a declarative storage transition")]
struct Cli {
    /// Path to the probed devicegraph, as XML.
    #[arg(long)]
    probed: PathBuf,

    /// Path to the staging devicegraph describing the desired end state, as XML.
    #[arg(long)]
    staging: PathBuf,

    /// Print the planned actions without committing them.
    #[arg(long)]
    dry_run: bool,

    /// Target a disk image being assembled from scratch rather than a
    /// running system's hardware: permits creating (but never deleting) a
    /// Disk node.
    #[arg(long)]
    image: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let probed_xml = fs::read_to_string(&cli.probed)
        .with_context(|| format!("reading probed devicegraph from {}", cli.probed.display()))?;
    let probed = DeviceGraph::from_xml(&probed_xml).context("parsing probed devicegraph")?;

    let staging_xml = fs::read_to_string(&cli.staging)
        .with_context(|| format!("reading staging devicegraph from {}", cli.staging.display()))?;
    let staging = DeviceGraph::from_xml(&staging_xml).context("parsing staging devicegraph")?;

    check_graph("probed", &probed)?;
    check_graph("staging", &staging)?;

    let mode = if cli.image { TargetMode::Image } else { TargetMode::Direct };
    let (action_graph, order) = storplan::actiongraph::build(&probed, &staging, mode).context("planning transition")?;

    let groups = compound::group(&action_graph, &order);
    for group in &groups {
        log::info!("{}", group.sentence(&staging, &action_graph));
    }

    if cli.dry_run {
        println!("{} action(s) planned, dry run requested, nothing committed", order.len());
        return Ok(());
    }

    let mut executor = LoggingExecutor::new(false);
    commit(&probed, &staging, &action_graph, &order, &mut executor)?;

    println!("{} action(s) committed", order.len());
    Ok(())
}

fn check_graph(label: &str, graph: &DeviceGraph) -> Result<()> {
    graph.check().map_err(|errors| {
        let joined = errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
        anyhow::anyhow!("{label} devicegraph failed validation: {joined}")
    })
}

/// The device name of `sid` in `graph`, for executor calls that take member
/// names rather than SIDs (`mdadm_create`, `lvm_create_vg`, ...).
fn blk_name(graph: &DeviceGraph, sid: Sid) -> String {
    graph.find_by_sid(sid).and_then(Device::as_blk_device).map(|b| b.name.clone()).unwrap_or_default()
}

fn parent_of_kind(graph: &DeviceGraph, sid: Sid, want: impl Fn(&Device) -> bool) -> Option<Sid> {
    graph
        .parents(sid)
        .unwrap_or_default()
        .into_iter()
        .find(|&p| graph.find_by_sid(p).map(&want).unwrap_or(false))
}

fn child_of_kind(graph: &DeviceGraph, sid: Sid, want: impl Fn(&Device) -> bool) -> Option<Sid> {
    graph
        .children(sid)
        .unwrap_or_default()
        .into_iter()
        .find(|&c| graph.find_by_sid(c).map(&want).unwrap_or(false))
}

fn commit_create(rhs: &DeviceGraph, executor: &mut dyn SystemExecutor, target: Sid) -> Result<()> {
    match rhs.find_by_sid(target) {
        Some(Device::Partition(p)) => {
            let table = parent_of_kind(rhs, target, |d| matches!(d, Device::PartitionTable(_))).unwrap_or(target);
            executor.create_partition(table, p.blk.region.start, p.blk.region.length, p.partition_type, p.id)?;
        }
        Some(Device::PartitionTable(pt)) => {
            let disk = parent_of_kind(rhs, target, |d| matches!(d, Device::Disk(_))).unwrap_or(target);
            executor.create_pt(disk, pt.kind)?;
        }
        Some(Device::Md(_)) => {
            let members: Vec<String> = rhs.parents(target).unwrap_or_default().into_iter().map(|m| blk_name(rhs, m)).collect();
            executor.mdadm_create(target, &members)?;
        }
        Some(Device::LvmVg(_)) => {
            let pvs: Vec<String> = rhs.parents(target).unwrap_or_default().into_iter().map(|m| blk_name(rhs, m)).collect();
            executor.lvm_create_vg(target, &pvs)?;
        }
        Some(Device::LvmLv(lv)) => {
            let vg = parent_of_kind(rhs, target, |d| matches!(d, Device::LvmVg(_)));
            let extents = match (vg, vg.and_then(|v| rhs.find_by_sid(v))) {
                (Some(vg), Some(Device::LvmVg(vg_attrs))) => vg_attrs.extent_count(lv.blk.size_bytes()),
                _ => 0,
            };
            executor.lvm_create_lv(target, vg.unwrap_or(target), extents)?;
        }
        Some(Device::Filesystem(fs)) => executor.mkfs(target, fs.fs_type, &fs.mkfs_options)?,
        Some(Device::MountPoint(mp)) => {
            let fs = parent_of_kind(rhs, target, |d| matches!(d, Device::Filesystem(_))).unwrap_or(target);
            executor.mount(fs, &mp.path)?;
        }
        // Disk/Bcache/BcacheCset/Encryption creation has no dedicated primitive in
        // this executor contract; surfacing readiness is the closest available op.
        _ => executor.wait_for_device(target)?,
    }
    Ok(())
}

fn commit_delete(lhs: &DeviceGraph, executor: &mut dyn SystemExecutor, target: Sid) -> Result<()> {
    match lhs.find_by_sid(target) {
        Some(Device::Partition(_)) => executor.delete_partition(target)?,
        Some(Device::LvmLv(_)) => executor.lvm_remove_lv(target)?,
        Some(Device::LvmVg(_)) => executor.lvm_remove_vg(target)?,
        Some(Device::Md(_)) => executor.mdadm_stop(target)?,
        Some(Device::MountPoint(mp)) => {
            let fs = parent_of_kind(lhs, target, |d| matches!(d, Device::Filesystem(_))).unwrap_or(target);
            executor.umount(fs, &mp.path)?;
        }
        // PartitionTable/Filesystem/Bcache/BcacheCset/Encryption teardown has no
        // dedicated primitive; wiping the on-disk signature is the closest op.
        _ => executor.wipefs(target)?,
    }
    Ok(())
}

fn commit_resize(lhs: &DeviceGraph, rhs: &DeviceGraph, executor: &mut dyn SystemExecutor, target: Sid) -> Result<()> {
    match rhs.find_by_sid(target).or_else(|| lhs.find_by_sid(target)) {
        Some(Device::Partition(_)) => {
            let region = rhs.find_by_sid(target).and_then(Device::as_blk_device).map(|b| &b.region);
            let new_end = region.map(|r| r.end()).unwrap_or(0);
            executor.resize_partition(target, new_end)?;
        }
        Some(Device::Filesystem(_)) => {
            let old_size = lhs.find_by_sid(target).map(Device::size_bytes).unwrap_or(0);
            let new_size = rhs.find_by_sid(target).map(Device::size_bytes).unwrap_or(0);
            executor.resize_fs(target, storplan::resize::resize_mode(old_size, new_size))?;
        }
        Some(Device::LvmLv(lv)) => {
            let vg = parent_of_kind(rhs, target, |d| matches!(d, Device::LvmVg(_)));
            let extents = match vg.and_then(|v| rhs.find_by_sid(v)) {
                Some(Device::LvmVg(vg_attrs)) => vg_attrs.extent_count(lv.blk.size_bytes()),
                _ => 0,
            };
            executor.lvm_resize_lv(target, extents)?;
        }
        // An Md array's own size is derived from its members and never resized
        // directly; its members resize and the array follows.
        _ => executor.wait_for_device(target)?,
    }
    Ok(())
}

fn commit_reallot(lhs: &DeviceGraph, rhs: &DeviceGraph, executor: &mut dyn SystemExecutor, mode: ReallotMode, member: Sid) -> Result<()> {
    let (graph, member_name) = match mode {
        ReallotMode::Extend => (rhs, blk_name(rhs, member)),
        ReallotMode::Reduce => (lhs, blk_name(lhs, member)),
    };
    let container = child_of_kind(graph, member, |d| matches!(d, Device::Md(_)));
    match (container, mode) {
        (Some(md), ReallotMode::Extend) => executor.mdadm_add(md, &member_name)?,
        (Some(md), ReallotMode::Reduce) => executor.mdadm_remove(md, &member_name)?,
        // LVM has no extend/reduce-a-VG's-PV-set primitive in this executor
        // contract; VGs are only ever created/removed whole.
        _ => executor.wait_for_device(member)?,
    }
    Ok(())
}

fn commit_modify(lhs: &DeviceGraph, rhs: &DeviceGraph, executor: &mut dyn SystemExecutor, target: Sid) -> Result<()> {
    match (lhs.find_by_sid(target), rhs.find_by_sid(target)) {
        (Some(Device::Partition(l)), Some(Device::Partition(r))) => {
            if l.id != r.id {
                executor.set_partition_id(target, r.id)?;
            }
            if l.boot != r.boot {
                executor.set_boot_flag(target, r.boot)?;
            }
            if l.legacy_boot != r.legacy_boot {
                executor.set_legacy_boot_flag(target, r.legacy_boot)?;
            }
        }
        (_, Some(Device::Filesystem(fs))) => {
            if let Some(label) = &fs.label {
                executor.set_label(target, label)?;
            }
            if let Some(uuid) = &fs.uuid {
                executor.set_uuid(target, &uuid.to_string())?;
            }
        }
        // PartitionTable/LvmVg/Encryption/MountPoint attribute changes have no
        // dedicated mutate primitive in this executor contract.
        _ => executor.wait_for_device(target)?,
    }
    Ok(())
}

fn commit(
    lhs: &DeviceGraph,
    rhs: &DeviceGraph,
    action_graph: &ActionGraph,
    order: &[petgraph::graph::NodeIndex],
    executor: &mut dyn SystemExecutor,
) -> Result<()> {
    for &idx in order {
        let action = action_graph.action(idx);
        match &action.kind {
            ActionKind::Create => commit_create(rhs, executor, action.target)?,
            ActionKind::Delete => commit_delete(lhs, executor, action.target)?,
            ActionKind::Modify => commit_modify(lhs, rhs, executor, action.target)?,
            ActionKind::Resize => commit_resize(lhs, rhs, executor, action.target)?,
            ActionKind::Reallot(mode) => commit_reallot(lhs, rhs, executor, *mode, action.target)?,
            ActionKind::Rename(new_name) => match rhs.find_by_sid(action.target) {
                Some(Device::LvmLv(_)) => executor.lvm_rename_lv(action.target, new_name)?,
                _ => executor.wait_for_device(action.target)?,
            },
            ActionKind::TmpMount(path) => executor.mount(action.target, path)?,
            ActionKind::TmpUnmount => executor.umount(action.target, "")?,
            ActionKind::Activate => executor.lvm_change_activation(action.target, true)?,
            ActionKind::Deactivate => executor.lvm_change_activation(action.target, false)?,
            ActionKind::SetBoot(on) => executor.set_boot_flag(action.target, *on)?,
            ActionKind::SetLegacyBoot(on) => executor.set_legacy_boot_flag(action.target, *on)?,
            ActionKind::SetPartitionId(id) => executor.set_partition_id(action.target, *id)?,
            ActionKind::AddEtcMdadm => executor.add_etc_mdadm(action.target)?,
        }
    }
    Ok(())
}
