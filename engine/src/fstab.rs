//! `/etc/fstab` modeling: the option-list type, a parsed file with ordered
//! entries, mount-order normalisation, and the space-encoding rule. Grounded
//! on `EtcFstab.h`/`EtcFstab.cc`, generalized from a single global file to a
//! reusable type the planner can build from a devicegraph and diff against
//! an on-disk copy.

use devgraph::device::{BlkDeviceAttrs, Filesystem};
use sysdefs::MountByType;

/// The mount-option column of one fstab entry: an ordered, deduplicated-on-
/// read list of comma-separated tokens, with the literal `defaults` meaning
/// "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountOptions {
    opts: Vec<String>,
}

impl MountOptions {
    pub fn parse(opt_string: &str) -> Self {
        let decoded = fstab_decode(opt_string);
        let mut opts: Vec<String> = decoded.split(',').map(str::to_string).collect();
        opts.retain(|o| o != "defaults");
        Self { opts }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.opts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opts.is_empty()
    }

    pub fn contains(&self, opt: &str) -> bool {
        self.opts.iter().any(|o| o == opt)
    }

    pub fn append(&mut self, opt: impl Into<String>) {
        self.opts.push(opt.into());
    }

    pub fn remove(&mut self, opt: &str) {
        self.opts.retain(|o| o != opt);
    }

    pub fn has_subvol(&self) -> bool {
        self.opts.iter().any(|o| o.starts_with("subvol=") || o.starts_with("subvolid="))
    }

    /// Renders the column value: `"defaults"` when empty, else the options
    /// joined with commas in their stored order.
    pub fn format(&self) -> String {
        if self.opts.is_empty() {
            "defaults".to_string()
        } else {
            self.opts.join(",")
        }
    }
}

/// One parsed `/etc/fstab` line's six whitespace-separated columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabEntry {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub mount_options: MountOptions,
    pub dump_pass: u32,
    pub fsck_pass: u32,
}

impl FstabEntry {
    pub fn mount_by(&self) -> MountByType {
        MountByType::from_device_spec(&self.device)
    }

    fn format_line(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            fstab_encode(&self.device),
            fstab_encode(&self.mount_point),
            self.fs_type,
            fstab_encode(&self.mount_options.format()),
            self.dump_pass,
            self.fsck_pass,
        )
    }
}

pub fn fstab_encode(unencoded: &str) -> String {
    unencoded.replace(' ', "\\040")
}

pub fn fstab_decode(encoded: &str) -> String {
    encoded.replace("\\040", " ")
}

/// An in-memory `/etc/fstab`, preserving comments and blank lines verbatim
/// alongside parsed entries (via `Line`), so `render()` reproduces anything
/// the engine didn't touch byte-for-byte.
#[derive(Debug, Clone, Default)]
pub struct FstabFile {
    lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry(FstabEntry),
    Verbatim(String),
}

impl FstabFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let mut file = FstabFile::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                file.lines.push(Line::Verbatim(line.to_string()));
                continue;
            }
            let columns: Vec<&str> = trimmed.split_whitespace().collect();
            if columns.len() < 4 {
                file.lines.push(Line::Verbatim(line.to_string()));
                continue;
            }
            let dump_pass = columns.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
            let fsck_pass = columns.get(5).and_then(|s| s.parse().ok()).unwrap_or(0);
            file.lines.push(Line::Entry(FstabEntry {
                device: fstab_decode(columns[0]),
                mount_point: fstab_decode(columns[1]),
                fs_type: columns[2].to_string(),
                mount_options: MountOptions::parse(columns[3]),
                dump_pass,
                fsck_pass,
            }));
        }
        file
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry(entry) => out.push_str(&entry.format_line()),
                Line::Verbatim(text) => out.push_str(text),
            }
            out.push('\n');
        }
        out
    }

    pub fn entries(&self) -> impl Iterator<Item = &FstabEntry> {
        self.lines.iter().filter_map(|l| match l {
            Line::Entry(e) => Some(e),
            Line::Verbatim(_) => None,
        })
    }

    fn entry_indices(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, l)| matches!(l, Line::Entry(_)).then_some(i))
            .collect()
    }

    fn entry_at(&self, entry_index: usize) -> &FstabEntry {
        let idx = self.entry_indices()[entry_index];
        match &self.lines[idx] {
            Line::Entry(e) => e,
            Line::Verbatim(_) => unreachable!(),
        }
    }

    /// Index (among entries only) `entry` should be inserted before:
    /// the first existing entry whose mount point is `entry`'s mount point
    /// or a path beneath it. `None` means "append at the end".
    fn find_sort_index(&self, entry: &FstabEntry) -> Option<usize> {
        let indices = self.entry_indices();
        for (i, &line_idx) in indices.iter().enumerate() {
            if let Line::Entry(candidate) = &self.lines[line_idx] {
                if candidate != entry && candidate.mount_point.starts_with(&entry.mount_point) {
                    return Some(i);
                }
            }
        }
        None
    }

    pub fn add(&mut self, entry: FstabEntry) {
        match self.find_sort_index(&entry) {
            Some(entry_index) => {
                let line_idx = self.entry_indices()[entry_index];
                self.lines.insert(line_idx, Line::Entry(entry));
            }
            None => self.lines.push(Line::Entry(entry)),
        }
    }

    /// Appends without sorting, for building a file in an arbitrary starting
    /// order (e.g. to test `fix_mount_order` itself).
    #[cfg(test)]
    fn add_entry_unsorted(&mut self, entry: FstabEntry) {
        self.lines.push(Line::Entry(entry));
    }

    fn next_mount_order_problem(&self, start_index: usize) -> Option<usize> {
        let count = self.entry_indices().len();
        for i in start_index..count {
            let entry = self.entry_at(i).clone();
            if let Some(index) = self.find_sort_index(&entry) {
                if index < i {
                    return Some(i);
                }
            }
        }
        None
    }

    pub fn check_mount_order(&self) -> bool {
        self.next_mount_order_problem(0).is_none()
    }

    /// Repeatedly takes the first out-of-order entry and reinserts it at its
    /// correct index, terminating in O(n^2): once index `i` is fixed,
    /// scanning resumes at `i+1`, so duplicate mount points (which have no
    /// single correct order) can't cause an infinite loop.
    pub fn fix_mount_order(&mut self) {
        let mut start_index = 0;
        loop {
            let count = self.entry_indices().len();
            if start_index >= count {
                return;
            }
            let Some(problem_index) = self.next_mount_order_problem(start_index) else {
                return;
            };

            let line_idx = self.entry_indices()[problem_index];
            let entry = match self.lines.remove(line_idx) {
                Line::Entry(e) => e,
                Line::Verbatim(_) => unreachable!(),
            };
            self.add(entry);

            start_index = problem_index + 1;
        }
    }

    pub fn find_device(&self, device: &str) -> Option<&FstabEntry> {
        self.entries().find(|e| e.device == device)
    }

    pub fn find_all_devices(&self, device: &str) -> Vec<&FstabEntry> {
        self.entries().filter(|e| e.device == device).collect()
    }

    pub fn find_mount_point(&self, mount_point: &str) -> Option<&FstabEntry> {
        self.entries().find(|e| e.mount_point == mount_point)
    }

    /// Finds the entry whose device column names `uuid`, however it's
    /// spelled (`UUID=...` or a `by-uuid` path).
    pub fn find_by_uuid(&self, uuid: &sysdefs::OsUuid) -> Option<&FstabEntry> {
        self.entries().find(|e| uuid.matches_spec(&e.device))
    }
}

/// Every spelling `/etc/fstab` could use to name `blk_device` and its
/// filesystem: the plain device name, one entry per stable udev path/id
/// alias, and label/UUID forms when the filesystem carries them.
pub fn construct_device_aliases(blk_device: &BlkDeviceAttrs, filesystem: &Filesystem) -> Vec<String> {
    let mut aliases = vec![blk_device.name.clone()];

    for path in &blk_device.udev_paths {
        aliases.push(format!("/dev/disk/by-path/{path}"));
    }
    for id in &blk_device.udev_ids {
        aliases.push(format!("/dev/disk/by-id/{id}"));
    }

    if let Some(label) = &filesystem.label {
        if !label.is_empty() {
            aliases.push(format!("LABEL={label}"));
            aliases.push(format!("/dev/disk/by-label/{label}"));
        }
    }
    if let Some(uuid) = &filesystem.uuid {
        aliases.push(uuid.fstab_spec());
        aliases.push(uuid.by_uuid_alias());
    }

    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_options_defaults_to_empty_format() {
        let opts = MountOptions::parse("defaults");
        assert!(opts.is_empty());
        assert_eq!(opts.format(), "defaults");
    }

    #[test]
    fn mount_options_round_trip_comma_list() {
        let opts = MountOptions::parse("noatime,ro");
        assert_eq!(opts.format(), "noatime,ro");
        assert!(opts.contains("ro"));
    }

    #[test]
    fn fstab_encode_decode_round_trip() {
        let s = "/mnt/my disk";
        assert_eq!(fstab_decode(&fstab_encode(s)), s);
    }

    fn entry(mount_point: &str) -> FstabEntry {
        FstabEntry {
            device: format!("/dev/{}", mount_point.replace('/', "_")),
            mount_point: mount_point.to_string(),
            fs_type: "ext4".to_string(),
            mount_options: MountOptions::empty(),
            dump_pass: 0,
            fsck_pass: 2,
        }
    }

    #[test]
    fn fix_mount_order_orders_nested_mount_points() {
        let mut file = FstabFile::new();
        for mp in ["/var/log", "/var", "/space/walk", "/space", "/"] {
            file.add_entry_unsorted(entry(mp));
        }
        assert!(!file.check_mount_order());

        file.fix_mount_order();
        assert!(file.check_mount_order());

        let order: Vec<&str> = file.entries().map(|e| e.mount_point.as_str()).collect();
        assert_eq!(order, vec!["/", "/var", "/var/log", "/space", "/space/walk"]);
    }

    #[test]
    fn fix_mount_order_terminates_with_duplicate_mount_points() {
        let mut file = FstabFile::new();
        for mp in ["/a", "/a", "/"] {
            file.add_entry_unsorted(entry(mp));
        }
        file.fix_mount_order();
        assert!(file.check_mount_order());
    }

    #[test]
    fn construct_device_aliases_includes_all_spellings() {
        use devgraph::region::Region;

        let mut blk = BlkDeviceAttrs::new("/dev/sda1", Region::new(0, 10, 512));
        blk.udev_paths.push("pci-0000:00:1f.2-ata-1".to_string());
        blk.udev_ids.push("ata-WDC-serial".to_string());

        let mut fs = Filesystem::new(sysdefs::FilesystemType::Ext4);
        fs.label = Some("root".to_string());
        fs.uuid = Some(sysdefs::OsUuid::from("abcd-1234"));

        let aliases = construct_device_aliases(&blk, &fs);
        assert!(aliases.contains(&"/dev/sda1".to_string()));
        assert!(aliases.contains(&"/dev/disk/by-path/pci-0000:00:1f.2-ata-1".to_string()));
        assert!(aliases.contains(&"/dev/disk/by-id/ata-WDC-serial".to_string()));
        assert!(aliases.contains(&"LABEL=root".to_string()));
        assert!(aliases.contains(&"/dev/disk/by-uuid/abcd-1234".to_string()));
    }

    #[test]
    fn find_by_uuid_matches_either_device_spelling() {
        let mut file = FstabFile::new();
        file.add(FstabEntry {
            device: "UUID=abcd-1234".to_string(),
            mount_point: "/".to_string(),
            fs_type: "ext4".to_string(),
            mount_options: MountOptions::empty(),
            dump_pass: 0,
            fsck_pass: 1,
        });

        let uuid = sysdefs::OsUuid::from("abcd-1234");
        assert_eq!(file.find_by_uuid(&uuid).unwrap().mount_point, "/");
        assert!(file.find_by_uuid(&sysdefs::OsUuid::from("0000")).is_none());
    }
}
