use std::io::{ BufRead, BufReader };
use std::path::Path;
use std::fs::File;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{ Result, TracerError };
use crate::tuple::Tuple4D;
use crate::shape::Shape;

/// One corner of a face: vertex, texture and normal indices (one-based).
type ObjFace = Vec<(usize, Option<usize>, Option<usize>)>;

/// A parser for a subset of the OBJ mesh format.
///
/// Supports `v` vertices, `vn` normals, `f` faces and `g` groups. Anything
/// else is skipped and counted in `ignored_lines`. Normals are read and their
/// indices checked, but triangles are always flat.
#[derive(Clone, Debug)]
pub struct ObjParser {
    pub ignored_lines: usize,

    pub vertices: Vec<Tuple4D>,
    pub normals: Vec<Tuple4D>,

    /// Triangles, by group name. Faces before any `g` go into `""`.
    pub groups: BTreeMap<String, Shape>,
}

impl Default for ObjParser {
    fn default() -> ObjParser {
        let mut groups = BTreeMap::new();
        groups.insert(String::new(), Shape::group());

        ObjParser {
            ignored_lines: 0,
            vertices: Vec::new(),
            normals: Vec::new(),
            groups,
        }
    }
}

impl ObjParser {
    /// Parses OBJ text from any buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<ObjParser> {
        let mut parser = ObjParser::default();

        // The group that faces are currently being added to.
        let mut current_group = String::new();
        for (n, line) in reader.lines().enumerate() {
            parser.handle_command(&line?, n + 1, &mut current_group)?;
        }

        log::debug!("Parsed OBJ: {} vertices, {} groups, {} ignored lines",
            parser.vertices.len(), parser.groups.len(), parser.ignored_lines);
        Ok(parser)
    }

    /// Opens and parses the OBJ file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ObjParser> {
        let file = File::open(path.as_ref())?;
        ObjParser::parse(BufReader::new(file))
    }

    /// Parses a single line. `line_no` is one-based and only used in errors.
    ///
    /// ```obj
    /// v -1 1 0
    /// v -1 0 0
    /// v 1 0 0
    /// v 1 1 0
    ///
    /// g FirstGroup
    /// f 1 2 3
    /// g SecondGroup
    /// f 1 3 4
    /// ```
    ///
    /// Groups do not nest: `SecondGroup` above is a sibling of `FirstGroup`.
    /// Naming a group a second time switches back to it.
    fn handle_command(&mut self, line: &str, line_no: usize,
        current_group: &mut String) -> Result<()> {
        let params: Vec<&str> = line.split_whitespace().collect();

        match params.first().copied() {
            Some("v") => {
                let (x, y, z) = parse_xyz(&params, line_no)?;
                self.vertices.push(Tuple4D::point(x, y, z));
            },
            Some("vn") => {
                let (x, y, z) = parse_xyz(&params, line_no)?;
                self.normals.push(Tuple4D::vector(x, y, z));
            },
            Some("f") => {
                let face = self.parse_face(&params[1..], line_no)?;
                let group = self.groups.entry(current_group.clone())
                    .or_insert_with(Shape::group);

                for triangle in fan_triangulation(&self.vertices, &face) {
                    group.add_child(triangle)?;
                }
            },
            Some("g") if params.len() >= 2 => {
                let name = params[1..].join(" ");
                self.groups.entry(name.clone()).or_insert_with(Shape::group);
                *current_group = name;
            },
            // Blank lines and comments don't count as ignored.
            None => {},
            Some(p) if p.starts_with('#') => {},
            Some(_) => self.ignored_lines += 1,
        }

        Ok(())
    }

    fn parse_face(&self, corners: &[&str], line_no: usize) -> Result<ObjFace> {
        if corners.len() < 3 {
            return Err(obj_error(line_no, "a face needs at least three vertices"));
        }

        let mut face = ObjFace::with_capacity(corners.len());
        for corner in corners {
            // `v`, `v/vt`, `v//vn` or `v/vt/vn`.
            let mut attributes = corner.split('/');
            let v = parse_index(attributes.next(), line_no)?
                .ok_or_else(|| obj_error(line_no, "face corner has no vertex index"))?;
            let vt = parse_index(attributes.next(), line_no)?;
            let vn = parse_index(attributes.next(), line_no)?;

            if attributes.next().is_some() {
                return Err(obj_error(line_no,
                    format!("too many attributes in face corner `{}`", corner)));
            }
            if v > self.vertices.len() {
                return Err(obj_error(line_no,
                    format!("vertex index {} out of range", v)));
            }
            if vn.map_or(false, |vn| vn > self.normals.len()) {
                return Err(obj_error(line_no, "normal index out of range"));
            }

            face.push((v, vt, vn));
        }

        Ok(face)
    }

    /// Collects every named group into one group, ready for a scene.
    ///
    /// Empty groups are dropped. The unnamed default group is included like
    /// any other.
    pub fn into_group(self) -> Result<Shape> {
        let mut root = Shape::group();
        for (_, group) in self.groups {
            if group.children().map_or(false, |c| !c.is_empty()) {
                root.add_child(group)?;
            }
        }

        Ok(root)
    }
}

fn obj_error<S: Into<String>>(line: usize, message: S) -> TracerError {
    TracerError::Obj { line, message: message.into() }
}

fn parse_number<T: FromStr>(s: &str, line_no: usize) -> Result<T> {
    s.parse().map_err(|_| obj_error(line_no, format!("invalid number `{}`", s)))
}

fn parse_xyz(params: &[&str], line_no: usize) -> Result<(f64, f64, f64)> {
    if params.len() < 4 {
        return Err(obj_error(line_no,
            format!("`{}` needs three coordinates", params[0])));
    }

    Ok((
        parse_number(params[1], line_no)?,
        parse_number(params[2], line_no)?,
        parse_number(params[3], line_no)?,
    ))
}

/// Parses an optional one-based index; an empty field (as in `1//3`) is `None`.
fn parse_index(field: Option<&str>, line_no: usize) -> Result<Option<usize>> {
    match field {
        None | Some("") => Ok(None),
        Some(s) => {
            let i: usize = parse_number(s, line_no)?;
            if i == 0 {
                return Err(obj_error(line_no, "OBJ indices start at 1"));
            }
            Ok(Some(i))
        },
    }
}

/// Splits a convex polygon into triangles sharing its first vertex.
///
/// ```text
///         B *
///          / \
///       A *   * C
///         |   |
///       E *---* D
/// ```
///
/// The face `A B C D E` becomes `A-B-C`, `A-C-D` and `A-D-E`. Indices are
/// assumed to have been range-checked already.
fn fan_triangulation(vertices: &[Tuple4D], face: &ObjFace) -> Vec<Shape> {
    let corner = |i: usize| vertices[face[i].0 - 1];

    (1..face.len() - 1)
        .map(|i| Shape::triangle(corner(0), corner(i), corner(i + 1)))
        .collect()
}

#[cfg(test)]
fn parse_str(text: &str) -> Result<ObjParser> {
    ObjParser::parse(text.as_bytes())
}

#[test]
fn ignoring_unrecognized_lines() {
    let gibberish = "There was a young lady named Bright\n\
        who traveled much faster than light.\n\
        She set out one day\n\
        in a relative way,\n\
        and came back the previous night.\n";
    let parser = parse_str(gibberish).unwrap();

    assert_eq!(parser.ignored_lines, 5);
}

#[test]
fn vertex_records() {
    let parser = parse_str("v -1 1 0\nv -1.0000 0.5000 0.0000\nv 1 0 0\nv 1 1 0\n")
        .unwrap();

    assert_eq!(parser.vertices[0], Tuple4D::point(-1.0, 1.0, 0.0));
    assert_eq!(parser.vertices[1], Tuple4D::point(-1.0, 0.5, 0.0));
    assert_eq!(parser.vertices[2], Tuple4D::point( 1.0, 0.0, 0.0));
    assert_eq!(parser.vertices[3], Tuple4D::point( 1.0, 1.0, 0.0));
}

#[test]
fn parsing_triangle_faces() {
    let parser = parse_str("v -1 1 0\nv -1 0 0\nv 1 0 0\nv 1 1 0\n\n\
        f 1 2 3\nf 1 3 4\n").unwrap();

    let children = parser.groups[""].children().unwrap();
    let t1 = children[0].triangle_info().unwrap();
    let t2 = children[1].triangle_info().unwrap();

    assert_eq!(t1.p1, parser.vertices[0]);
    assert_eq!(t1.p2, parser.vertices[1]);
    assert_eq!(t1.p3, parser.vertices[2]);
    assert_eq!(t2.p1, parser.vertices[0]);
    assert_eq!(t2.p2, parser.vertices[2]);
    assert_eq!(t2.p3, parser.vertices[3]);
}

#[test]
fn triangulating_polygons() {
    let parser = parse_str("v -1 1 0\nv -1 0 0\nv 1 0 0\nv 1 1 0\nv 0 2 0\n\n\
        f 1 2 3 4 5\n").unwrap();

    let children = parser.groups[""].children().unwrap();
    assert_eq!(children.len(), 3);

    let t3 = children[2].triangle_info().unwrap();
    assert_eq!(t3.p1, parser.vertices[0]);
    assert_eq!(t3.p2, parser.vertices[3]);
    assert_eq!(t3.p3, parser.vertices[4]);
}

#[test]
fn triangles_in_groups() {
    let parser = parse_str("v -1 1 0\nv -1 0 0\nv 1 0 0\nv 1 1 0\n\n\
        g FirstGroup\nf 1 2 3\ng SecondGroup\nf 1 3 4\n").unwrap();

    let first = parser.groups["FirstGroup"].children().unwrap();
    let second = parser.groups["SecondGroup"].children().unwrap();
    assert_eq!(first[0].triangle_info().unwrap().p2, parser.vertices[1]);
    assert_eq!(second[0].triangle_info().unwrap().p2, parser.vertices[2]);

    let root = parser.into_group().unwrap();
    assert_eq!(root.children().unwrap().len(), 2);
}

#[test]
fn faces_with_texture_and_normal_indices() {
    let parser = parse_str("v 0 1 0\nv -1 0 0\nv 1 0 0\n\n\
        vn -1 0 0\nvn 1 0 0\nvn 0 1 0\n\n\
        f 1//3 2//1 3//2\nf 1/0/3 2/102/1 3/14/2\n");

    // Texture index 0 is invalid.
    assert!(parser.is_err());

    let parser = parse_str("v 0 1 0\nv -1 0 0\nv 1 0 0\n\n\
        vn -1 0 0\nvn 1 0 0\nvn 0 1 0\n\n\
        f 1//3 2//1 3//2\nf 1/1/3 2/102/1 3/14/2\n").unwrap();

    let children = parser.groups[""].children().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], children[1]);
}

#[test]
fn vertex_index_out_of_range_is_an_error() {
    match parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n") {
        Err(TracerError::Obj { line, .. }) => assert_eq!(line, 4),
        other => panic!("expected an OBJ error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn malformed_vertex_is_an_error() {
    assert!(matches!(parse_str("v 1 two 3\n"),
        Err(TracerError::Obj { line: 1, .. })));
    assert!(matches!(parse_str("v 1 2\n"),
        Err(TracerError::Obj { line: 1, .. })));
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let parser = parse_str("# a comment\n\nv 0 0 0\n").unwrap();

    assert_eq!(parser.ignored_lines, 0);
    assert_eq!(parser.vertices.len(), 1);
}

#[test]
fn empty_groups_are_dropped() {
    let parser = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\ng Empty\ng Full\nf 1 2 3\n")
        .unwrap();

    let root = parser.into_group().unwrap();
    assert_eq!(root.children().unwrap().len(), 1);
}
