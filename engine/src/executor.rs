//! The boundary between planning and the outside world: `SystemExecutor`
//! takes named operations with typed parameters, never a shell command
//! line, so a `do_*` body stays testable without mocking a process runner.
//! Grounded in shape on `engine::resize`'s own typed steps — the executor is
//! just the next layer down, turning a `ResizeStep`/`Action` into one call.

use devgraph::device::partition_table::PartitionTableKind;
use devgraph::Sid;
use sysdefs::{FilesystemType, PartitionId, PartitionType, ResizeMode};

use crate::error::ExecutionException;

pub type ExecResult = Result<(), ExecutionException>;

/// Every side-effecting operation the planner can ask the outside world to
/// perform, named exactly as listed for the executor contract: one method
/// per verb, parameters as values rather than a formatted command string.
pub trait SystemExecutor {
    fn create_partition(&mut self, table: Sid, start: u64, length: u64, kind: PartitionType, id: PartitionId) -> ExecResult;
    fn delete_partition(&mut self, partition: Sid) -> ExecResult;
    fn set_partition_id(&mut self, partition: Sid, id: PartitionId) -> ExecResult;
    fn set_boot_flag(&mut self, partition: Sid, on: bool) -> ExecResult;
    fn set_legacy_boot_flag(&mut self, partition: Sid, on: bool) -> ExecResult;
    fn resize_partition(&mut self, partition: Sid, new_end: u64) -> ExecResult;

    fn create_pt(&mut self, device: Sid, kind: PartitionTableKind) -> ExecResult;

    fn mkfs(&mut self, filesystem: Sid, fs_type: FilesystemType, options: &[String]) -> ExecResult;
    fn resize_fs(&mut self, filesystem: Sid, mode: ResizeMode) -> ExecResult;
    fn mount(&mut self, filesystem: Sid, path: &str) -> ExecResult;
    fn umount(&mut self, filesystem: Sid, path: &str) -> ExecResult;
    fn set_label(&mut self, filesystem: Sid, label: &str) -> ExecResult;
    fn set_uuid(&mut self, filesystem: Sid, uuid: &str) -> ExecResult;

    fn lvm_create_vg(&mut self, vg: Sid, pv_names: &[String]) -> ExecResult;
    fn lvm_create_lv(&mut self, lv: Sid, vg: Sid, extents: u64) -> ExecResult;
    fn lvm_remove_vg(&mut self, vg: Sid) -> ExecResult;
    fn lvm_remove_lv(&mut self, lv: Sid) -> ExecResult;
    fn lvm_resize_lv(&mut self, lv: Sid, extents: u64) -> ExecResult;
    fn lvm_rename_lv(&mut self, lv: Sid, new_name: &str) -> ExecResult;
    fn lvm_change_activation(&mut self, lv: Sid, active: bool) -> ExecResult;

    fn mdadm_create(&mut self, md: Sid, members: &[String]) -> ExecResult;
    fn mdadm_add(&mut self, md: Sid, member: &str) -> ExecResult;
    fn mdadm_remove(&mut self, md: Sid, member: &str) -> ExecResult;
    fn mdadm_stop(&mut self, md: Sid) -> ExecResult;
    fn add_etc_mdadm(&mut self, md: Sid) -> ExecResult;

    fn wipefs(&mut self, device: Sid) -> ExecResult;
    fn udev_settle(&mut self) -> ExecResult;
    fn wait_for_device(&mut self, device: Sid) -> ExecResult;
}

/// Demonstration executor: logs every call at info level and, outside
/// `--dry-run`, always succeeds. Stands in for the real mkfs/lvm/mdadm
/// invokers, which are out of scope.
pub struct LoggingExecutor {
    pub dry_run: bool,
}

impl LoggingExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    fn log(&self, action: &str, target: Sid) {
        if self.dry_run {
            log::info!("[dry-run] {action} on sid {target}");
        } else {
            log::info!("{action} on sid {target}");
        }
    }
}

impl SystemExecutor for LoggingExecutor {
    fn create_partition(&mut self, table: Sid, start: u64, length: u64, kind: PartitionType, id: PartitionId) -> ExecResult {
        self.log(&format!("create_partition(start={start}, length={length}, kind={kind}, id={id})"), table);
        Ok(())
    }

    fn delete_partition(&mut self, partition: Sid) -> ExecResult {
        self.log("delete_partition", partition);
        Ok(())
    }

    fn set_partition_id(&mut self, partition: Sid, id: PartitionId) -> ExecResult {
        self.log(&format!("set_partition_id({id})"), partition);
        Ok(())
    }

    fn set_boot_flag(&mut self, partition: Sid, on: bool) -> ExecResult {
        self.log(&format!("set_boot_flag({on})"), partition);
        Ok(())
    }

    fn set_legacy_boot_flag(&mut self, partition: Sid, on: bool) -> ExecResult {
        self.log(&format!("set_legacy_boot_flag({on})"), partition);
        Ok(())
    }

    fn resize_partition(&mut self, partition: Sid, new_end: u64) -> ExecResult {
        self.log(&format!("resize_partition(new_end={new_end})"), partition);
        Ok(())
    }

    fn create_pt(&mut self, device: Sid, kind: PartitionTableKind) -> ExecResult {
        self.log(&format!("create_pt({})", kind.name()), device);
        Ok(())
    }

    fn mkfs(&mut self, filesystem: Sid, fs_type: FilesystemType, options: &[String]) -> ExecResult {
        self.log(&format!("mkfs({fs_type:?}, {options:?})"), filesystem);
        Ok(())
    }

    fn resize_fs(&mut self, filesystem: Sid, mode: ResizeMode) -> ExecResult {
        self.log(&format!("resize_fs({mode:?})"), filesystem);
        Ok(())
    }

    fn mount(&mut self, filesystem: Sid, path: &str) -> ExecResult {
        self.log(&format!("mount({path})"), filesystem);
        Ok(())
    }

    fn umount(&mut self, filesystem: Sid, path: &str) -> ExecResult {
        self.log(&format!("umount({path})"), filesystem);
        Ok(())
    }

    fn set_label(&mut self, filesystem: Sid, label: &str) -> ExecResult {
        self.log(&format!("set_label({label})"), filesystem);
        Ok(())
    }

    fn set_uuid(&mut self, filesystem: Sid, uuid: &str) -> ExecResult {
        self.log(&format!("set_uuid({uuid})"), filesystem);
        Ok(())
    }

    fn lvm_create_vg(&mut self, vg: Sid, pv_names: &[String]) -> ExecResult {
        self.log(&format!("lvm_create_vg({pv_names:?})"), vg);
        Ok(())
    }

    fn lvm_create_lv(&mut self, lv: Sid, vg: Sid, extents: u64) -> ExecResult {
        self.log(&format!("lvm_create_lv(vg=sid {vg}, extents={extents})"), lv);
        Ok(())
    }

    fn lvm_remove_vg(&mut self, vg: Sid) -> ExecResult {
        self.log("lvm_remove_vg", vg);
        Ok(())
    }

    fn lvm_remove_lv(&mut self, lv: Sid) -> ExecResult {
        self.log("lvm_remove_lv", lv);
        Ok(())
    }

    fn lvm_resize_lv(&mut self, lv: Sid, extents: u64) -> ExecResult {
        self.log(&format!("lvm_resize_lv(extents={extents})"), lv);
        Ok(())
    }

    fn lvm_rename_lv(&mut self, lv: Sid, new_name: &str) -> ExecResult {
        self.log(&format!("lvm_rename_lv({new_name})"), lv);
        Ok(())
    }

    fn lvm_change_activation(&mut self, lv: Sid, active: bool) -> ExecResult {
        self.log(&format!("lvm_change_activation({active})"), lv);
        Ok(())
    }

    fn mdadm_create(&mut self, md: Sid, members: &[String]) -> ExecResult {
        self.log(&format!("mdadm_create({members:?})"), md);
        Ok(())
    }

    fn mdadm_add(&mut self, md: Sid, member: &str) -> ExecResult {
        self.log(&format!("mdadm_add({member})"), md);
        Ok(())
    }

    fn mdadm_remove(&mut self, md: Sid, member: &str) -> ExecResult {
        self.log(&format!("mdadm_remove({member})"), md);
        Ok(())
    }

    fn mdadm_stop(&mut self, md: Sid) -> ExecResult {
        self.log("mdadm_stop", md);
        Ok(())
    }

    fn add_etc_mdadm(&mut self, md: Sid) -> ExecResult {
        self.log("add_etc_mdadm", md);
        Ok(())
    }

    fn wipefs(&mut self, device: Sid) -> ExecResult {
        self.log("wipefs", device);
        Ok(())
    }

    fn udev_settle(&mut self) -> ExecResult {
        log::info!("udev_settle");
        Ok(())
    }

    fn wait_for_device(&mut self, device: Sid) -> ExecResult {
        self.log("wait_for_device", device);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_executor_always_succeeds() {
        let mut exec = LoggingExecutor::new(true);
        assert!(exec.udev_settle().is_ok());
        assert!(exec.wipefs(Sid(1)).is_ok());
    }
}
