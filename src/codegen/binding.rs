// Full-binding generators: client wrappers, server interface, handlers and
// the service descriptor table.
//
// Not reachable from `ServiceDriver::generate` in either emission mode;
// callers that want live RPC bindings invoke `emit_service_bindings`
// themselves.

use super::SupportPackages;
use super::names::{camel_case, exported_name, unexport};
use super::printer::Printer;
use super::service::ResolvedMethod;

/// One service as seen by the binding generators.
#[derive(Debug, Clone, Copy)]
pub struct ServiceBindings<'a> {
    /// Declared service name.
    pub name: &'a str,
    /// `package.Service`.
    pub full_name: &'a str,
    /// Proto file name, recorded in the descriptor table.
    pub metadata: &'a str,
    pub methods: &'a [ResolvedMethod<'a>],
}

fn is_unary(method: &ResolvedMethod<'_>) -> bool {
    !method.client_streaming && !method.server_streaming
}

/// Emit client, server and descriptor table for one service.
pub fn emit_service_bindings(
    out: &mut Printer,
    packages: &SupportPackages,
    service: &ServiceBindings<'_>,
) {
    let serv_name = camel_case(service.name);
    let desc_var = format!("_{}_serviceDesc", serv_name);
    let client_type = format!("{}Client", unexport(&serv_name));

    out.line(format!("// Client API for {} service", serv_name));
    out.blank();
    out.line(format!("type {}Client interface {{", serv_name));
    out.indent();
    for method in service.methods {
        out.line(client_signature(packages, &serv_name, method));
    }
    out.outdent();
    out.line("}");
    out.blank();

    out.line(format!("type {} struct {{", client_type));
    out.indent();
    out.line(format!("cc *{}.ClientConn", packages.grpc));
    out.outdent();
    out.line("}");
    out.blank();

    out.line(format!(
        "func New{}Client(cc *{}.ClientConn) {}Client {{",
        serv_name, packages.grpc, serv_name
    ));
    out.indent();
    out.line(format!("return &{}{{cc}}", client_type));
    out.outdent();
    out.line("}");
    out.blank();

    let mut method_index = 0;
    let mut stream_index = 0;
    for method in service.methods {
        let desc_expr = if is_unary(method) {
            method_index += 1;
            format!("&{}.Methods[{}]", desc_var, method_index - 1)
        } else {
            stream_index += 1;
            format!("&{}.Streams[{}]", desc_var, stream_index - 1)
        };
        emit_client_method(out, packages, &serv_name, service.full_name, method, &desc_expr);
    }

    out.line(format!("// Server API for {} service", serv_name));
    out.blank();
    let server_type = format!("{}Server", serv_name);
    out.line(format!("type {} interface {{", server_type));
    out.indent();
    for method in service.methods {
        out.line(server_signature(packages, &serv_name, method));
    }
    out.outdent();
    out.line("}");
    out.blank();

    out.line(format!(
        "func Register{}Server(s *{}.Server, srv {}) {{",
        serv_name, packages.grpc, server_type
    ));
    out.indent();
    out.line(format!("s.RegisterService(&{}, srv)", desc_var));
    out.outdent();
    out.line("}");
    out.blank();

    let handlers: Vec<String> = service
        .methods
        .iter()
        .map(|method| emit_server_method(out, packages, &serv_name, service.full_name, method))
        .collect();

    emit_service_desc(out, packages, service, &desc_var, &server_type, &handlers);
}

/// Client-side method signature, e.g.
/// `SayHello(ctx context.Context, in *pb.HelloRequest, opts ...grpc.CallOption) (*pb.HelloResponse, error)`.
pub fn client_signature(
    packages: &SupportPackages,
    serv_name: &str,
    method: &ResolvedMethod<'_>,
) -> String {
    let meth_name = exported_name(method.name);
    let req_arg = if method.client_streaming {
        String::new()
    } else {
        format!(", in *{}", method.input.qualified())
    };
    let resp_name = if is_unary(method) {
        format!("*{}", method.output.qualified())
    } else {
        format!("{}_{}Client", serv_name, meth_name)
    };
    format!(
        "{}(ctx {}.Context{}, opts ...{}.CallOption) ({}, error)",
        meth_name, packages.context, req_arg, packages.grpc, resp_name
    )
}

fn emit_client_method(
    out: &mut Printer,
    packages: &SupportPackages,
    serv_name: &str,
    full_serv_name: &str,
    method: &ResolvedMethod<'_>,
    desc_expr: &str,
) {
    let sname = format!("/{}/{}", full_serv_name, method.name);
    let meth_name = exported_name(method.name);
    let in_type = method.input.qualified();
    let out_type = method.output.qualified();
    let grpc = &packages.grpc;

    out.line(format!(
        "func (c *{}Client) {} {{",
        unexport(serv_name),
        client_signature(packages, serv_name, method)
    ));
    out.indent();
    if is_unary(method) {
        out.line(format!("out := new({})", out_type));
        out.line(format!(
            "err := {}.Invoke(ctx, \"{}\", in, out, c.cc, opts...)",
            grpc, sname
        ));
        emit_return_on_error(out, "nil, err");
        out.line("return out, nil");
        out.outdent();
        out.line("}");
        out.blank();
        return;
    }

    let stream_type = format!("{}{}Client", unexport(serv_name), meth_name);
    out.line(format!(
        "stream, err := {}.NewClientStream(ctx, {}, c.cc, \"{}\", opts...)",
        grpc, desc_expr, sname
    ));
    emit_return_on_error(out, "nil, err");
    out.line(format!("x := &{}{{stream}}", stream_type));
    if !method.client_streaming {
        emit_return_on_error_call(out, "x.ClientStream.SendMsg(in)", "nil, err");
        emit_return_on_error_call(out, "x.ClientStream.CloseSend()", "nil, err");
    }
    out.line("return x, nil");
    out.outdent();
    out.line("}");
    out.blank();

    let gen_send = method.client_streaming;
    let gen_recv = method.server_streaming;
    let gen_close_and_recv = !method.server_streaming;

    out.line(format!("type {}_{}Client interface {{", serv_name, meth_name));
    out.indent();
    if gen_send {
        out.line(format!("Send(*{}) error", in_type));
    }
    if gen_recv {
        out.line(format!("Recv() (*{}, error)", out_type));
    }
    if gen_close_and_recv {
        out.line(format!("CloseAndRecv() (*{}, error)", out_type));
    }
    out.line(format!("{}.ClientStream", grpc));
    out.outdent();
    out.line("}");
    out.blank();

    emit_stream_struct(out, &stream_type, &format!("{}.ClientStream", grpc));

    if gen_send {
        emit_send(out, &stream_type, "Send", "ClientStream", &in_type);
    }
    if gen_recv {
        emit_recv(out, &stream_type, "Recv", "ClientStream", &out_type, false);
    }
    if gen_close_and_recv {
        emit_recv(out, &stream_type, "CloseAndRecv", "ClientStream", &out_type, true);
    }
}

/// Server-side interface method signature.
pub fn server_signature(
    packages: &SupportPackages,
    serv_name: &str,
    method: &ResolvedMethod<'_>,
) -> String {
    let meth_name = exported_name(method.name);
    let mut req_args = Vec::new();
    let mut ret = "error".to_string();
    if is_unary(method) {
        req_args.push(format!("{}.Context", packages.context));
        ret = format!("(*{}, error)", method.output.qualified());
    }
    if !method.client_streaming {
        req_args.push(format!("*{}", method.input.qualified()));
    }
    if !is_unary(method) {
        req_args.push(format!("{}_{}Server", serv_name, meth_name));
    }
    format!("{}({}) {}", meth_name, req_args.join(", "), ret)
}

/// Emit the dispatch handler for one method and return its name.
fn emit_server_method(
    out: &mut Printer,
    packages: &SupportPackages,
    serv_name: &str,
    full_serv_name: &str,
    method: &ResolvedMethod<'_>,
) -> String {
    let meth_name = exported_name(method.name);
    let hname = format!("_{}_{}_Handler", serv_name, meth_name);
    let in_type = method.input.qualified();
    let out_type = method.output.qualified();
    let ctx = &packages.context;
    let grpc = &packages.grpc;

    if is_unary(method) {
        out.line(format!(
            "func {}(srv interface{{}}, ctx {}.Context, dec func(interface{{}}) error, interceptor {}.UnaryServerInterceptor) (interface{{}}, error) {{",
            hname, ctx, grpc
        ));
        out.indent();
        out.line(format!("in := new({})", in_type));
        emit_return_on_error_call(out, "dec(in)", "nil, err");
        out.line("if interceptor == nil {");
        out.indent();
        out.line(format!(
            "return srv.({}Server).{}(ctx, in)",
            serv_name, meth_name
        ));
        out.outdent();
        out.line("}");
        out.line(format!("info := &{}.UnaryServerInfo{{", grpc));
        out.indent();
        out.line("Server:     srv,");
        out.line(format!(
            "FullMethod: \"/{}/{}\",",
            full_serv_name, method.name
        ));
        out.outdent();
        out.line("}");
        out.line(format!(
            "handler := func(ctx {}.Context, req interface{{}}) (interface{{}}, error) {{",
            ctx
        ));
        out.indent();
        out.line(format!(
            "return srv.({}Server).{}(ctx, req.(*{}))",
            serv_name, meth_name, in_type
        ));
        out.outdent();
        out.line("}");
        out.line("return interceptor(ctx, in, info, handler)");
        out.outdent();
        out.line("}");
        out.blank();
        return hname;
    }

    let stream_type = format!("{}{}Server", unexport(serv_name), meth_name);
    out.line(format!(
        "func {}(srv interface{{}}, stream {}.ServerStream) error {{",
        hname, grpc
    ));
    out.indent();
    if method.client_streaming {
        out.line(format!(
            "return srv.({}Server).{}(&{}{{stream}})",
            serv_name, meth_name, stream_type
        ));
    } else {
        out.line(format!("m := new({})", in_type));
        emit_return_on_error_call(out, "stream.RecvMsg(m)", "err");
        out.line(format!(
            "return srv.({}Server).{}(m, &{}{{stream}})",
            serv_name, meth_name, stream_type
        ));
    }
    out.outdent();
    out.line("}");
    out.blank();

    let gen_send = method.server_streaming;
    let gen_send_and_close = !method.server_streaming;
    let gen_recv = method.client_streaming;

    out.line(format!("type {}_{}Server interface {{", serv_name, meth_name));
    out.indent();
    if gen_send {
        out.line(format!("Send(*{}) error", out_type));
    }
    if gen_send_and_close {
        out.line(format!("SendAndClose(*{}) error", out_type));
    }
    if gen_recv {
        out.line(format!("Recv() (*{}, error)", in_type));
    }
    out.line(format!("{}.ServerStream", grpc));
    out.outdent();
    out.line("}");
    out.blank();

    emit_stream_struct(out, &stream_type, &format!("{}.ServerStream", grpc));

    if gen_send {
        emit_send(out, &stream_type, "Send", "ServerStream", &out_type);
    }
    if gen_send_and_close {
        emit_send(out, &stream_type, "SendAndClose", "ServerStream", &out_type);
    }
    if gen_recv {
        emit_recv(out, &stream_type, "Recv", "ServerStream", &in_type, false);
    }

    hname
}

fn emit_service_desc(
    out: &mut Printer,
    packages: &SupportPackages,
    service: &ServiceBindings<'_>,
    desc_var: &str,
    server_type: &str,
    handlers: &[String],
) {
    let grpc = &packages.grpc;
    out.line(format!("var {} = {}.ServiceDesc{{", desc_var, grpc));
    out.indent();
    out.line(format!("ServiceName: \"{}\",", service.full_name));
    out.line(format!("HandlerType: (*{})(nil),", server_type));

    out.line(format!("Methods: []{}.MethodDesc{{", grpc));
    out.indent();
    for (method, handler) in service.methods.iter().zip(handlers) {
        if !is_unary(method) {
            continue;
        }
        out.line("{");
        out.indent();
        out.line(format!("MethodName: \"{}\",", method.name));
        out.line(format!("Handler:    {},", handler));
        out.outdent();
        out.line("},");
    }
    out.outdent();
    out.line("},");

    out.line(format!("Streams: []{}.StreamDesc{{", grpc));
    out.indent();
    for (method, handler) in service.methods.iter().zip(handlers) {
        if is_unary(method) {
            continue;
        }
        out.line("{");
        out.indent();
        out.line(format!("StreamName:    \"{}\",", method.name));
        out.line(format!("Handler:       {},", handler));
        if method.server_streaming {
            out.line("ServerStreams: true,");
        }
        if method.client_streaming {
            out.line("ClientStreams: true,");
        }
        out.outdent();
        out.line("},");
    }
    out.outdent();
    out.line("},");
    out.line(format!("Metadata: \"{}\",", service.metadata));
    out.outdent();
    out.line("}");
    out.blank();
}

fn emit_stream_struct(out: &mut Printer, stream_type: &str, embedded: &str) {
    out.line(format!("type {} struct {{", stream_type));
    out.indent();
    out.line(embedded);
    out.outdent();
    out.line("}");
    out.blank();
}

fn emit_send(out: &mut Printer, stream_type: &str, func: &str, stream_field: &str, msg_type: &str) {
    out.line(format!(
        "func (x *{}) {}(m *{}) error {{",
        stream_type, func, msg_type
    ));
    out.indent();
    out.line(format!("return x.{}.SendMsg(m)", stream_field));
    out.outdent();
    out.line("}");
    out.blank();
}

fn emit_recv(
    out: &mut Printer,
    stream_type: &str,
    func: &str,
    stream_field: &str,
    msg_type: &str,
    close_first: bool,
) {
    out.line(format!(
        "func (x *{}) {}() (*{}, error) {{",
        stream_type, func, msg_type
    ));
    out.indent();
    if close_first {
        emit_return_on_error_call(out, &format!("x.{}.CloseSend()", stream_field), "nil, err");
    }
    out.line(format!("m := new({})", msg_type));
    emit_return_on_error_call(out, &format!("x.{}.RecvMsg(m)", stream_field), "nil, err");
    out.line("return m, nil");
    out.outdent();
    out.line("}");
    out.blank();
}

fn emit_return_on_error(out: &mut Printer, values: &str) {
    out.line("if err != nil {");
    out.indent();
    out.line(format!("return {}", values));
    out.outdent();
    out.line("}");
}

fn emit_return_on_error_call(out: &mut Printer, call: &str, values: &str) {
    out.line(format!("if err := {}; err != nil {{", call));
    out.indent();
    out.line(format!("return {}", values));
    out.outdent();
    out.line("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::ResolvedType;

    fn packages() -> SupportPackages {
        SupportPackages {
            context: "context".to_string(),
            grpc: "grpc".to_string(),
            import_prefix: String::new(),
        }
    }

    fn resolved(name: &str) -> ResolvedType {
        ResolvedType {
            alias: "pb".to_string(),
            name: name.to_string(),
            import_path: "greet".to_string(),
        }
    }

    fn method(name: &'static str, client_streaming: bool, server_streaming: bool) -> ResolvedMethod<'static> {
        ResolvedMethod {
            name,
            input: resolved("Req"),
            output: resolved("Resp"),
            client_streaming,
            server_streaming,
            comment: None,
        }
    }

    #[test]
    fn client_signatures_follow_streaming_flags() {
        let pkgs = packages();
        assert_eq!(
            client_signature(&pkgs, "Greeter", &method("say_hello", false, false)),
            "SayHello(ctx context.Context, in *pb.Req, opts ...grpc.CallOption) (*pb.Resp, error)"
        );
        assert_eq!(
            client_signature(&pkgs, "Greeter", &method("Upload", true, false)),
            "Upload(ctx context.Context, opts ...grpc.CallOption) (Greeter_UploadClient, error)"
        );
        assert_eq!(
            client_signature(&pkgs, "Greeter", &method("Watch", false, true)),
            "Watch(ctx context.Context, in *pb.Req, opts ...grpc.CallOption) (Greeter_WatchClient, error)"
        );
    }

    #[test]
    fn server_signatures_follow_streaming_flags() {
        let pkgs = packages();
        assert_eq!(
            server_signature(&pkgs, "Greeter", &method("Hello", false, false)),
            "Hello(context.Context, *pb.Req) (*pb.Resp, error)"
        );
        assert_eq!(
            server_signature(&pkgs, "Greeter", &method("Watch", false, true)),
            "Watch(*pb.Req, Greeter_WatchServer) error"
        );
        assert_eq!(
            server_signature(&pkgs, "Greeter", &method("Chat", true, true)),
            "Chat(Greeter_ChatServer) error"
        );
    }

    #[test]
    fn descriptor_table_splits_unary_and_streaming() {
        let methods = [
            method("Hello", false, false),
            method("Watch", false, true),
            method("Bye", false, false),
            method("Chat", true, true),
        ];
        let service = ServiceBindings {
            name: "Greeter",
            full_name: "greet.Greeter",
            metadata: "greet.proto",
            methods: &methods,
        };
        let mut out = Printer::new();
        emit_service_bindings(&mut out, &packages(), &service);
        let text = out.as_str();

        assert!(text.contains("type GreeterClient interface {"));
        assert!(text.contains("func NewGreeterClient(cc *grpc.ClientConn) GreeterClient {"));
        assert!(text.contains("func RegisterGreeterServer(s *grpc.Server, srv GreeterServer) {"));
        assert!(text.contains("grpc.NewClientStream(ctx, &_Greeter_serviceDesc.Streams[0], c.cc, \"/greet.Greeter/Watch\", opts...)"));
        assert!(text.contains("grpc.NewClientStream(ctx, &_Greeter_serviceDesc.Streams[1], c.cc, \"/greet.Greeter/Chat\", opts...)"));
        assert!(text.contains("\t\t\tMethodName: \"Hello\",\n\t\t\tHandler:    _Greeter_Hello_Handler,\n"));
        assert!(text.contains("StreamName:    \"Chat\","));
        assert!(text.contains("ClientStreams: true,"));
        assert!(text.contains("Metadata: \"greet.proto\","));

        let methods_table = text.find("Methods: []grpc.MethodDesc{").unwrap();
        let streams_table = text.find("Streams: []grpc.StreamDesc{").unwrap();
        let bye = text.find("MethodName: \"Bye\"").unwrap();
        let watch = text.find("StreamName:    \"Watch\"").unwrap();
        assert!(methods_table < bye && bye < streams_table && streams_table < watch);
    }

    #[test]
    fn reserved_method_names_match_across_interface_and_handlers() {
        let methods = [method("String", false, false), method("Reset", false, true)];
        let service = ServiceBindings {
            name: "G",
            full_name: "svc.G",
            metadata: "svc.proto",
            methods: &methods,
        };
        let mut out = Printer::new();
        emit_service_bindings(&mut out, &packages(), &service);
        let text = out.as_str();

        assert!(text.contains("\tString_(context.Context, *pb.Req) (*pb.Resp, error)\n"));
        assert!(text.contains("return srv.(GServer).String_(ctx, in)"));
        assert!(text.contains("return srv.(GServer).String_(ctx, req.(*pb.Req))"));
        assert!(!text.contains(").String("));
        assert!(text.contains("FullMethod: \"/svc.G/String\","));
        assert!(text.contains("c.cc, \"/svc.G/String\", opts...)"));
        assert!(text.contains("MethodName: \"String\","));
        assert!(text.contains("func _G_String__Handler("));

        assert!(text.contains("\tReset_(*pb.Req, G_Reset_Server) error\n"));
        assert!(text.contains("return srv.(GServer).Reset_(m, &gReset_Server{stream})"));
        assert!(text.contains("type G_Reset_Server interface {"));
        assert!(text.contains("StreamName:    \"Reset\","));
    }

    #[test]
    fn server_streaming_handler_receives_first_message() {
        let methods = [method("Watch", false, true)];
        let service = ServiceBindings {
            name: "Greeter",
            full_name: "greet.Greeter",
            metadata: "greet.proto",
            methods: &methods,
        };
        let mut out = Printer::new();
        emit_service_bindings(&mut out, &packages(), &service);
        let text = out.as_str();

        assert!(text.contains("func _Greeter_Watch_Handler(srv interface{}, stream grpc.ServerStream) error {"));
        assert!(text.contains("\tif err := stream.RecvMsg(m); err != nil {\n\t\treturn err\n\t}\n"));
        assert!(text.contains("func (x *greeterWatchServer) Send(m *pb.Resp) error {"));
        assert!(!text.contains("SendAndClose"));
    }
}
