use nestdiff_common::Result;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes to sniff from the head of a file. ISO9660 keeps its volume
/// descriptor at offset 0x8001, so the window has to reach past 32 KiB.
const SNIFF_LEN: usize = 64 * 1024;

/// Identify a file by inode kind and content magic, returning a
/// MIME-like string. Sniffing only; never extracts or dereferences.
pub fn sniff(path: &Path) -> Result<String> {
    let meta = std::fs::symlink_metadata(path)?;
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        return Ok("inode/symlink".to_string());
    }
    if file_type.is_dir() {
        return Ok("inode/directory".to_string());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if file_type.is_char_device() {
            return Ok("inode/chardevice".to_string());
        }
        if file_type.is_block_device() {
            return Ok("inode/blockdevice".to_string());
        }
        if file_type.is_fifo() {
            return Ok("inode/fifo".to_string());
        }
        if file_type.is_socket() {
            return Ok("inode/socket".to_string());
        }
    }

    if meta.len() == 0 {
        return Ok("inode/x-empty".to_string());
    }

    let mut buf = vec![0u8; SNIFF_LEN.min(meta.len() as usize)];
    let mut file = File::open(path)?;
    let mut read = 0;
    while read < buf.len() {
        let n = file.read(&mut buf[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    buf.truncate(read);

    Ok(sniff_bytes(&buf))
}

fn sniff_bytes(buf: &[u8]) -> String {
    // Formats infer does not know (or mis-files under look-alike magics)
    if is_gettext_mo(buf) {
        return "application/x-gettext-translation".to_string();
    }
    if is_java_class(buf) {
        return "application/java-vm".to_string();
    }

    if let Some(kind) = infer::get(buf) {
        return kind.mime_type().to_string();
    }

    if is_text(buf) {
        return "text/plain".to_string();
    }

    "application/octet-stream".to_string()
}

fn is_gettext_mo(buf: &[u8]) -> bool {
    buf.len() >= 4
        && (buf[..4] == [0xde, 0x12, 0x04, 0x95] || buf[..4] == [0x95, 0x04, 0x12, 0xde])
}

fn is_java_class(buf: &[u8]) -> bool {
    // 0xCAFEBABE is shared with fat Mach-O binaries; a class file keeps
    // its major version (45..) where Mach-O keeps a tiny arch count.
    if buf.len() < 8 || buf[..4] != [0xca, 0xfe, 0xba, 0xbe] {
        return false;
    }
    let major = u16::from_be_bytes([buf[6], buf[7]]);
    (45..=100).contains(&major)
}

fn is_text(buf: &[u8]) -> bool {
    if buf.contains(&0) {
        return false;
    }
    match std::str::from_utf8(buf) {
        Ok(_) => true,
        // The sniff window may cut a multi-byte sequence at its tail
        Err(e) => e.valid_up_to() + 3 >= buf.len(),
    }
}
