use block_fs::{
    disk::BLOCK_SIZE,
    fs::{
        config::{DATA_AREA_BLOCKS, MAX_FILE_BLOCKS, MAX_FILE_SIZE},
        SEEK_SET,
    },
    Fd, FileSystem, FileSystemError, MemDisk, Whence,
};

fn fresh() -> FileSystem<MemDisk> {
    FileSystem::format(MemDisk::new()).unwrap()
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

fn read_at(fs: &mut FileSystem<MemDisk>, fd: Fd, offset: u64, len: usize) -> Vec<u8> {
    fs.seek(fd, offset as i64, Whence::Set).unwrap();
    let mut buf = vec![0u8; len];
    let n = fs.read(fd, &mut buf).unwrap();
    buf.truncate(n);
    buf
}

#[test]
fn round_trip_for_assorted_lengths() {
    let mut fs = fresh();
    for (i, len) in [1, 511, 512, 513, 1024, 5000, 12 * 512 + 7]
        .into_iter()
        .enumerate()
    {
        let name = format!("rt{}", i);
        let data = pattern(len, i as u8);
        let fd = fs.create(&name).unwrap();
        assert_eq!(fs.write(fd, &data).unwrap(), len);
        assert_eq!(read_at(&mut fs, fd, 0, len), data, "length {}", len);
        fs.close(fd).unwrap();
    }
}

#[test]
fn read_is_clamped_at_eof() {
    let mut fs = fresh();
    let fd = fs.create("eof").unwrap();
    fs.write(fd, &pattern(700, 1)).unwrap();

    fs.seek(fd, 650, Whence::Set).unwrap();
    let mut buf = vec![0xEEu8; 200];
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 50);
    assert_eq!(&buf[..50], &pattern(700, 1)[650..]);
    assert!(buf[50..].iter().all(|&b| b == 0xEE));
    assert_eq!(fs.tell(fd).unwrap(), 700);

    assert_eq!(fs.read(fd, &mut buf).unwrap(), 0);
    assert_eq!(fs.tell(fd).unwrap(), 700);
}

#[test]
fn cross_block_write_leaves_neighbours_untouched() {
    let mut fs = fresh();
    let fd = fs.create("merge").unwrap();
    let before = pattern(2 * BLOCK_SIZE, 9);
    fs.write(fd, &before).unwrap();

    fs.seek(fd, 508, Whence::Set).unwrap();
    fs.write(fd, &[0xAB; 10]).unwrap();
    assert_eq!(fs.tell(fd).unwrap(), 518);
    assert_eq!(fs.size(fd).unwrap(), 2 * BLOCK_SIZE as u64);

    let after = read_at(&mut fs, fd, 0, 2 * BLOCK_SIZE);
    assert_eq!(&after[..508], &before[..508]);
    assert_eq!(&after[508..518], &[0xAB; 10]);
    assert_eq!(&after[518..], &before[518..]);
}

#[test]
fn write_past_size_grows_file() {
    let mut fs = fresh();
    let fd = fs.create("grow").unwrap();
    fs.write(fd, &pattern(100, 2)).unwrap();

    fs.seek(fd, 0, Whence::End).unwrap();
    let more = pattern(1500, 3);
    fs.write(fd, &more).unwrap();
    assert_eq!(fs.tell(fd).unwrap(), 1600);
    assert_eq!(fs.size(fd).unwrap(), 1600);
    assert_eq!(read_at(&mut fs, fd, 100, 1500), more);
    assert_eq!(fs.stat("grow").unwrap().blocks, 4);
}

#[test]
fn seek_validation() {
    let mut fs = fresh();
    let fd = fs.create("seek").unwrap();
    fs.write(fd, &[1u8; 20]).unwrap();

    let err = fs.seek_raw(fd, -1, SEEK_SET).unwrap_err();
    assert!(matches!(err, FileSystemError::BadCursor(-1)));
    assert!(err.is_fatal());

    let err = fs.seek_raw(fd, 5, 99).unwrap_err();
    assert!(matches!(err, FileSystemError::BadWhence(99)));
    assert!(err.is_fatal());

    assert!(matches!(
        fs.seek(fd, -3, Whence::End),
        Err(FileSystemError::BadCursor(-3))
    ));

    assert_eq!(fs.seek(fd, 10, Whence::End).unwrap(), 30);
    assert_eq!(fs.tell(fd).unwrap(), 30);
    assert_eq!(fs.seek(fd, 5, Whence::Cur).unwrap(), 35);
    assert_eq!(fs.size(fd).unwrap(), 20);
}

#[test]
fn reopen_keeps_contents_and_resets_cursor() {
    let mut fs = fresh();
    let data = pattern(900, 4);
    let fd = fs.create("again").unwrap();
    fs.write(fd, &data).unwrap();
    fs.close(fd).unwrap();

    let fd = fs.open("again").unwrap();
    assert_eq!(fs.tell(fd).unwrap(), 0);
    assert_eq!(fs.size(fd).unwrap(), 900);
    let mut buf = vec![0u8; 900];
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 900);
    assert_eq!(buf, data);
}

#[test]
fn zero_length_transfers_do_not_touch_the_store() {
    let mut fs = fresh();
    let fd = fs.create("zero").unwrap();
    fs.write(fd, b"abc").unwrap();
    fs.seek(fd, 1, Whence::Set).unwrap();

    let before = fs.disk().stats();
    let mut empty = [0u8; 0];
    assert_eq!(fs.read(fd, &mut empty).unwrap(), 0);
    assert_eq!(fs.write(fd, &[]).unwrap(), 0);
    assert_eq!(fs.disk().stats(), before);
    assert_eq!(fs.tell(fd).unwrap(), 1);
    assert_eq!(fs.size(fd).unwrap(), 3);
}

#[test]
fn partial_block_writes_read_modify_write_whole_blocks() {
    let mut fs = fresh();
    let fd = fs.create("rmw").unwrap();
    fs.write(fd, &pattern(BLOCK_SIZE, 5)).unwrap();
    fs.seek(fd, 100, Whence::Set).unwrap();

    let before = fs.disk().stats();
    fs.write(fd, b"0123456789").unwrap();
    let after = fs.disk().stats();
    assert_eq!(after.reads - before.reads, 1);
    assert_eq!(after.writes - before.writes, 1);
}

#[test]
fn no_space_keeps_committed_blocks() {
    let mut fs = fresh();
    let fd = fs.create("big").unwrap();
    let data = pattern(MAX_FILE_SIZE as usize + 700, 6);

    assert!(matches!(fs.write(fd, &data), Err(FileSystemError::NoSpace)));
    assert_eq!(fs.tell(fd).unwrap(), MAX_FILE_SIZE);
    assert_eq!(fs.size(fd).unwrap(), MAX_FILE_SIZE);
    assert_eq!(
        read_at(&mut fs, fd, 0, MAX_FILE_SIZE as usize),
        &data[..MAX_FILE_SIZE as usize]
    );
}

#[test]
fn filling_the_data_area_keeps_the_committed_prefix() {
    let mut fs = fresh();
    let data = pattern(MAX_FILE_SIZE as usize, 9);
    // 满文件占 140 个数据块加 1 个间接块
    let full_files = DATA_AREA_BLOCKS / (MAX_FILE_BLOCKS + 1);
    let leftover = DATA_AREA_BLOCKS % (MAX_FILE_BLOCKS + 1);

    for i in 0..full_files {
        let fd = fs.create(&format!("fill{}", i)).unwrap();
        assert_eq!(fs.write(fd, &data).unwrap(), data.len());
        fs.close(fd).unwrap();
    }
    assert_eq!(fs.free_blocks(), leftover);

    let fd = fs.create("last").unwrap();
    assert!(matches!(fs.write(fd, &data), Err(FileSystemError::NoSpace)));
    assert_eq!(fs.free_blocks(), 0);

    let committed = fs.size(fd).unwrap();
    assert_eq!(fs.tell(fd).unwrap(), committed);
    assert_eq!(committed % BLOCK_SIZE as u64, 0);
    assert!(committed > 0 && committed < MAX_FILE_SIZE);
    // 剩余块里有一个给了间接块
    assert_eq!(committed, (leftover - 1) * BLOCK_SIZE as u64);
    assert_eq!(fs.stat("last").unwrap().blocks as u64, leftover - 1);
    assert_eq!(
        read_at(&mut fs, fd, 0, committed as usize),
        &data[..committed as usize]
    );

    // 释放一个满文件后可以继续写
    fs.remove("fill0").unwrap();
    fs.seek(fd, committed as i64, Whence::Set).unwrap();
    let rest = &data[committed as usize..];
    assert_eq!(fs.write(fd, rest).unwrap(), rest.len());
    assert_eq!(fs.size(fd).unwrap(), MAX_FILE_SIZE);
    assert_eq!(read_at(&mut fs, fd, 0, MAX_FILE_SIZE as usize), data);
}

#[test]
fn shared_descriptor_shares_cursor() {
    let mut fs = fresh();
    let a = fs.create("shared").unwrap();
    let b = fs.open("shared").unwrap();
    assert_eq!(a, b);
    fs.write(a, b"hello").unwrap();
    assert_eq!(fs.tell(b).unwrap(), 5);

    fs.close(a).unwrap();
    assert_eq!(fs.tell(b).unwrap(), 5);
    fs.close(b).unwrap();
    assert!(matches!(fs.tell(b), Err(FileSystemError::BadFd(_))));
}

#[test]
fn data_survives_unmount_and_mount() {
    let mut fs = fresh();
    let data = pattern(20 * BLOCK_SIZE + 3, 7);
    {
        let mut file = fs.create_scoped("persist").unwrap();
        file.write(&data).unwrap();
    }
    let disk = fs.unmount().unwrap();

    let mut fs = FileSystem::mount(disk).unwrap();
    let fd = fs.open("persist").unwrap();
    assert_eq!(fs.size(fd).unwrap(), data.len() as u64);
    assert_eq!(read_at(&mut fs, fd, 0, data.len()), data);
}

#[test]
fn files_do_not_clobber_each_other() {
    let mut fs = fresh();
    let a = fs.create("a").unwrap();
    let b = fs.create("b").unwrap();
    let da = pattern(3000, 10);
    let db = pattern(3000, 20);
    // 交替写入，让两个文件的块交错分配
    for i in 0..6 {
        fs.write(a, &da[i * 500..(i + 1) * 500]).unwrap();
        fs.write(b, &db[i * 500..(i + 1) * 500]).unwrap();
    }
    assert_eq!(read_at(&mut fs, a, 0, 3000), da);
    assert_eq!(read_at(&mut fs, b, 0, 3000), db);
}
